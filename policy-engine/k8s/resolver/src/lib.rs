//! Validates and caches the Secrets and ConfigMaps that policies and filters
//! reference.
//!
//! The first [`ResourceResolver::resolve`] for a key validates the object and
//! stores the outcome. Every later call for that key returns the stored
//! outcome until the key is invalidated, so an object is validated at most
//! once no matter how many resources reference it.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod certificate;
mod config_map;
mod secret;

pub use self::certificate::{CaError, Certificate, TlsError, CA_KEY};
use ahash::AHashMap as HashMap;
use nginx_policy_engine_k8s_api::{ConfigMap, ResourceExt, Secret};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::{collections::BTreeMap, fmt, sync::Arc};
use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    Secret,
    ConfigMap,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespacedName {
    pub namespace: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    pub type_: ResourceType,
    pub name: NamespacedName,
}

/// A source object the resolver can validate.
#[derive(Clone, Debug, PartialEq)]
pub enum Object {
    Secret(Secret),
    ConfigMap(ConfigMap),
}

/// Certificate material tagged with the object it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertificateBundle {
    pub name: NamespacedName,
    pub kind: ResourceType,
    pub cert: Certificate,
}

/// The stored outcome of validating one key.
///
/// A failed validation keeps the source object and any bundle that could be
/// extracted; only `error` records the failure.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedEntry {
    pub source: Option<Object>,
    pub bundle: Option<CertificateBundle>,
    pub error: Option<ResolveError>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{0} {1} does not exist")]
    NotFound(ResourceType, NamespacedName),

    #[error("tls secret is invalid: {0}")]
    InvalidTls(#[source] TlsError),

    #[error(transparent)]
    InvalidCa(#[from] CaError),

    #[error("missing required key {key:?} in secret type {secret_type:?}")]
    MissingKey {
        key: &'static str,
        secret_type: &'static str,
    },

    #[error("unsupported secret type {0:?}")]
    UnsupportedSecretType(String),

    #[error("ConfigMap does not have the data or binaryData field {}", CA_KEY)]
    MissingCa,
}

/// Validates and memoizes referenced objects.
///
/// Each key's outcome lives in its own cell; the map lock is only held to find
/// or insert a cell, so resolving one key never waits on the validation of
/// another.
#[derive(Debug, Default)]
pub struct ResourceResolver {
    objects: RwLock<HashMap<ResourceKey, Object>>,
    entries: RwLock<HashMap<ResourceKey, Arc<OnceCell<Arc<ResolvedEntry>>>>>,
}

// === impl ResourceType ===

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Secret => "Secret",
            Self::ConfigMap => "ConfigMap",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

// === impl NamespacedName ===

impl NamespacedName {
    pub fn new(namespace: impl ToString, name: impl ToString) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }
}

impl fmt::Display for NamespacedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

// === impl ResourceKey ===

impl ResourceKey {
    pub fn secret(namespace: impl ToString, name: impl ToString) -> Self {
        Self {
            type_: ResourceType::Secret,
            name: NamespacedName::new(namespace, name),
        }
    }

    pub fn config_map(namespace: impl ToString, name: impl ToString) -> Self {
        Self {
            type_: ResourceType::ConfigMap,
            name: NamespacedName::new(namespace, name),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.type_, self.name)
    }
}

// === impl Object ===

impl Object {
    pub fn key(&self) -> ResourceKey {
        match self {
            Self::Secret(s) => ResourceKey::secret(s.namespace().unwrap_or_default(), s.name_any()),
            Self::ConfigMap(cm) => {
                ResourceKey::config_map(cm.namespace().unwrap_or_default(), cm.name_any())
            }
        }
    }
}

impl From<Secret> for Object {
    fn from(secret: Secret) -> Self {
        Self::Secret(secret)
    }
}

impl From<ConfigMap> for Object {
    fn from(cm: ConfigMap) -> Self {
        Self::ConfigMap(cm)
    }
}

// === impl ResolvedEntry ===

impl ResolvedEntry {
    fn not_found(key: &ResourceKey) -> Self {
        Self {
            source: None,
            bundle: None,
            error: Some(ResolveError::NotFound(key.type_, key.name.clone())),
        }
    }
}

// === impl ResourceResolver ===

impl ResourceResolver {
    pub fn new(objects: impl IntoIterator<Item = Object>) -> Self {
        let objects = objects.into_iter().map(|o| (o.key(), o)).collect();
        Self {
            objects: RwLock::new(objects),
            entries: RwLock::default(),
        }
    }

    /// Validates the referenced object, or returns the outcome of an earlier
    /// validation of the same key.
    pub fn resolve(
        &self,
        type_: ResourceType,
        name: NamespacedName,
    ) -> Result<(), ResolveError> {
        let key = ResourceKey { type_, name };
        let entry = self.entry(&key);
        match entry.error.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Returns every resolved key and its outcome.
    pub fn resolved(&self) -> BTreeMap<ResourceKey, Arc<ResolvedEntry>> {
        self.entries
            .read()
            .iter()
            .filter_map(|(key, cell)| Some((key.clone(), cell.get()?.clone())))
            .collect()
    }

    pub fn resolved_secrets(&self) -> BTreeMap<NamespacedName, Arc<ResolvedEntry>> {
        self.resolved_of(ResourceType::Secret)
    }

    pub fn resolved_config_maps(&self) -> BTreeMap<NamespacedName, Arc<ResolvedEntry>> {
        self.resolved_of(ResourceType::ConfigMap)
    }

    /// Forgets the outcome for `key` so the next resolve validates it again.
    pub fn invalidate(&self, key: &ResourceKey) {
        if self.entries.write().remove(key).is_some() {
            tracing::debug!(%key, "Invalidated");
        }
    }

    /// Adds or replaces a source object, discarding any outcome computed for
    /// the previous version.
    pub fn apply(&self, object: impl Into<Object>) {
        let object = object.into();
        let key = object.key();
        self.objects.write().insert(key.clone(), object);
        self.invalidate(&key);
    }

    pub fn delete(&self, key: &ResourceKey) {
        self.objects.write().remove(key);
        self.invalidate(key);
    }

    fn resolved_of(&self, type_: ResourceType) -> BTreeMap<NamespacedName, Arc<ResolvedEntry>> {
        self.resolved()
            .into_iter()
            .filter(|(key, _)| key.type_ == type_)
            .map(|(key, entry)| (key.name, entry))
            .collect()
    }

    fn entry(&self, key: &ResourceKey) -> Arc<ResolvedEntry> {
        let cell = self.cell(key);
        cell.get_or_init(|| Arc::new(self.validate(key))).clone()
    }

    fn cell(&self, key: &ResourceKey) -> Arc<OnceCell<Arc<ResolvedEntry>>> {
        if let Some(cell) = self.entries.read().get(key) {
            return cell.clone();
        }
        self.entries.write().entry(key.clone()).or_default().clone()
    }

    fn validate(&self, key: &ResourceKey) -> ResolvedEntry {
        let source = self.objects.read().get(key).cloned();
        let entry = match source {
            None => ResolvedEntry::not_found(key),
            Some(Object::Secret(secret)) => secret::validate(&key.name, secret),
            Some(Object::ConfigMap(cm)) => config_map::validate(&key.name, cm),
        };
        match &entry.error {
            Some(error) => tracing::debug!(%key, %error, "Resolved"),
            None => tracing::debug!(%key, "Resolved"),
        }
        entry
    }
}

#[cfg(test)]
mod tests;
