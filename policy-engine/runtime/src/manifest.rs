use crate::k8s::{
    policy::{AuthenticationFilter, ProxySettingsPolicy, RateLimitPolicy, SnippetsPolicy},
    ConfigMap, Resource, Secret,
};
use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize};
use std::path::Path;

/// Namespace given to resources that don't set one, as `kubectl apply` does.
const DEFAULT_NAMESPACE: &str = "default";

/// The resources read from a set of manifest files, in the order they were
/// read.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Manifests {
    pub proxy_settings: Vec<ProxySettingsPolicy>,
    pub rate_limits: Vec<RateLimitPolicy>,
    pub snippets: Vec<SnippetsPolicy>,
    pub authentication_filters: Vec<AuthenticationFilter>,
    pub secrets: Vec<Secret>,
    pub config_maps: Vec<ConfigMap>,
}

// === impl Manifests ===

impl Manifests {
    pub fn load<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> Result<Self> {
        let mut manifests = Self::default();
        for path in paths {
            let path = path.as_ref();
            let yaml = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            manifests
                .parse(&yaml)
                .with_context(|| format!("failed to parse {}", path.display()))?;
        }
        Ok(manifests)
    }

    /// Reads every document of a multi-document YAML stream. Empty documents
    /// and resources of other kinds are skipped.
    pub fn parse(&mut self, yaml: &str) -> Result<()> {
        for (i, document) in serde_yaml::Deserializer::from_str(yaml).enumerate() {
            let value = serde_json::Value::deserialize(document)
                .with_context(|| format!("invalid YAML in document {i}"))?;
            if value.is_null() {
                continue;
            }
            self.push(value)
                .with_context(|| format!("invalid resource in document {i}"))?;
        }
        Ok(())
    }

    fn push(&mut self, value: serde_json::Value) -> Result<()> {
        let field = |name: &str| {
            value
                .get(name)
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let api_version = field("apiVersion");
        let kind = field("kind");

        if is::<ProxySettingsPolicy>(&api_version, &kind) {
            self.proxy_settings.push(decode(value)?);
        } else if is::<RateLimitPolicy>(&api_version, &kind) {
            self.rate_limits.push(decode(value)?);
        } else if is::<SnippetsPolicy>(&api_version, &kind) {
            self.snippets.push(decode(value)?);
        } else if is::<AuthenticationFilter>(&api_version, &kind) {
            self.authentication_filters.push(decode(value)?);
        } else if is::<Secret>(&api_version, &kind) {
            self.secrets.push(decode(value)?);
        } else if is::<ConfigMap>(&api_version, &kind) {
            self.config_maps.push(decode(value)?);
        } else {
            tracing::warn!(%api_version, %kind, "Skipping unsupported resource");
        }
        Ok(())
    }
}

fn is<K: Resource<DynamicType = ()>>(api_version: &str, kind: &str) -> bool {
    K::api_version(&()) == api_version && K::kind(&()) == kind
}

fn decode<K>(value: serde_json::Value) -> Result<K>
where
    K: Resource<DynamicType = ()> + DeserializeOwned,
{
    let mut resource = serde_json::from_value::<K>(value)
        .with_context(|| format!("failed to decode {}", K::kind(&())))?;
    let meta = resource.meta_mut();
    if meta.namespace.is_none() {
        meta.namespace = Some(DEFAULT_NAMESPACE.to_string());
    }
    tracing::debug!(
        kind = %K::kind(&()),
        namespace = ?meta.namespace,
        name = ?meta.name,
        "Loaded"
    );
    Ok(resource)
}
