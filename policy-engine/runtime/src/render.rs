use crate::{
    core::{Condition, GeneratedFile, NginxContext, POLICY_ENGINE_CONTROLLER_NAME},
    k8s::{
        policy::{
            LocalPolicyTargetReference, PolicyAncestorStatus, PolicyStatus, ProxySettingsPolicy,
            RateLimitPolicy, SnippetsPolicy, TargetKind,
        },
        ParentReference, Resource, ResourceExt, Time,
    },
    policies::{
        mark_conflicts, Attachment, Generate, Generators, GlobalSettings, MergeOrder, Policy,
        PolicyKind, Role, Validate, Validator,
    },
    resolver::{Object, ResourceResolver},
    Manifests,
};
use anyhow::{Context, Result};
use std::{
    collections::{btree_map::Entry, BTreeMap},
    fmt,
    path::Path,
    sync::Arc,
};

/// Runs manifests through validation, conflict resolution and generation.
#[derive(Debug, Default)]
pub struct Render {
    globals: GlobalSettings,
    order: MergeOrder,
    generators: Generators,
}

/// A resource that policies attach to, in the policies' namespace.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Target {
    pub namespace: String,
    pub target_ref: LocalPolicyTargetReference,
}

/// The outcome of a render.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Rendered {
    /// Generated fragments, sorted by name.
    pub files: Vec<GeneratedFile>,

    /// The policies attached to each target, in precedence order.
    pub attachments: BTreeMap<Target, Vec<Attachment>>,

    /// Validation results for each AuthenticationFilter, keyed by
    /// `namespace/name`.
    pub filters: BTreeMap<String, Vec<Condition>>,
}

// === impl Render ===

impl Render {
    pub fn new(order: MergeOrder) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }

    pub fn with_globals(mut self, globals: GlobalSettings) -> Self {
        self.globals = globals;
        self
    }

    pub fn render(&self, manifests: Manifests) -> Rendered {
        let Manifests {
            proxy_settings,
            rate_limits,
            snippets,
            authentication_filters,
            secrets,
            config_maps,
        } = manifests;

        let resolver = ResourceResolver::new(
            secrets
                .into_iter()
                .map(Object::from)
                .chain(config_maps.into_iter().map(Object::from)),
        );
        let validator = Validator::new(Arc::new(resolver));

        let filters = authentication_filters
            .iter()
            .map(|filter| {
                let id = format!(
                    "{}/{}",
                    filter.namespace().unwrap_or_default(),
                    filter.name_any()
                );
                (id, validator.validate(filter))
            })
            .collect();

        let policies = proxy_settings
            .into_iter()
            .map(Policy::from)
            .chain(rate_limits.into_iter().map(Policy::from))
            .chain(snippets.into_iter().map(Policy::from));
        let mut by_target = BTreeMap::<Target, Vec<Policy>>::new();
        for policy in policies {
            if policy.target_refs().is_empty() {
                tracing::warn!(%policy, "Policy has no targets");
            }
            let namespace = policy.namespace();
            for target_ref in policy.target_refs() {
                let attached = by_target
                    .entry(Target::new(namespace.clone(), target_ref.clone()))
                    .or_default();
                if !attached.contains(&policy) {
                    attached.push(policy.clone());
                }
            }
        }

        let mut files = BTreeMap::<String, GeneratedFile>::new();
        let mut attachments = BTreeMap::new();
        for (target, policies) in by_target {
            let attached = mark_conflicts(&validator, &self.globals, policies, self.order);
            let accepted = attached
                .iter()
                .filter(|a| a.is_accepted())
                .map(|a| a.policy.clone())
                .collect::<Vec<_>>();

            for file in self.generate(&target, &accepted) {
                match files.entry(file.name.clone()) {
                    Entry::Vacant(entry) => {
                        entry.insert(file);
                    }
                    Entry::Occupied(entry) => {
                        if entry.get().content != file.content {
                            tracing::warn!(name = %file.name, %target, "Conflicting file contents");
                        }
                    }
                }
            }
            attachments.insert(target, attached);
        }

        Rendered {
            files: files.into_values().collect(),
            attachments,
            filters,
        }
    }

    fn generate(&self, target: &Target, accepted: &[Policy]) -> Vec<GeneratedFile> {
        match target.target_ref.target_kind() {
            Some(TargetKind::Gateway) => {
                let mut files = [NginxContext::Main, NginxContext::Http, NginxContext::Server]
                    .into_iter()
                    .flat_map(|context| self.generators.generate(context, accepted))
                    .collect::<Vec<_>>();

                // Location snippets are attached to the Gateway but apply to
                // each of its locations.
                let snippets = accepted
                    .iter()
                    .filter(|p| p.kind() == PolicyKind::Snippets)
                    .cloned()
                    .collect::<Vec<_>>();
                for context in [NginxContext::Location, NginxContext::InternalLocation] {
                    files.extend(self.generators.generate(context, &snippets));
                }
                files
            }

            Some(TargetKind::HttpRoute | TargetKind::GrpcRoute) => {
                // Zones can only be declared in the http context.
                let shadows = accepted
                    .iter()
                    .filter_map(|policy| match policy {
                        Policy::RateLimit {
                            policy,
                            role: Role::UserDefined,
                        } => Some(Policy::zone_shadow(policy.clone())),
                        _ => None,
                    })
                    .collect::<Vec<_>>();

                let mut files = self.generators.generate(NginxContext::Http, &shadows);
                for context in [NginxContext::Location, NginxContext::InternalLocation] {
                    files.extend(self.generators.generate(context, accepted));
                }
                files
            }

            // Policies can't be accepted at unsupported targets.
            None => Vec::new(),
        }
    }
}

// === impl Target ===

impl Target {
    pub fn new(namespace: impl ToString, target_ref: LocalPolicyTargetReference) -> Self {
        Self {
            namespace: namespace.to_string(),
            target_ref,
        }
    }

    fn parent_ref(&self) -> ParentReference {
        ParentReference {
            group: Some(self.target_ref.group.clone()),
            kind: Some(self.target_ref.kind.clone()),
            namespace: Some(self.namespace.clone()),
            name: self.target_ref.name.clone(),
            section_name: None,
            port: None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{}",
            self.target_ref.kind, self.namespace, self.target_ref.name
        )
    }
}

// === impl Rendered ===

impl Rendered {
    pub fn log_conditions(&self) {
        for (target, attachments) in &self.attachments {
            for attachment in attachments {
                let condition = attachment.status();
                tracing::info!(
                    %target,
                    policy = %attachment.policy,
                    accepted = condition.is_accepted(),
                    reason = condition.reason.as_str(),
                    "{}",
                    condition.message
                );
            }
        }

        for (filter, conditions) in &self.filters {
            match conditions.first() {
                None => tracing::info!(%filter, accepted = true, "AuthenticationFilter is valid"),
                Some(condition) => tracing::info!(
                    %filter,
                    accepted = false,
                    reason = condition.reason.as_str(),
                    "{}",
                    condition.message
                ),
            }
        }
    }

    /// Writes each generated file into `dir`, creating it if necessary.
    pub fn write_files(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        for file in &self.files {
            let path = dir.join(&file.name);
            std::fs::write(&path, &file.content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "Wrote");
        }
        Ok(())
    }

    /// The status each policy would be given, with one ancestor per target.
    ///
    /// Policies are keyed by `Kind namespace/name`.
    pub fn statuses(&self, now: Time) -> BTreeMap<String, (Policy, PolicyStatus)> {
        let mut statuses = BTreeMap::<String, (Policy, PolicyStatus)>::new();
        for (target, attachments) in &self.attachments {
            for attachment in attachments {
                let policy = &attachment.policy;
                let condition = attachment.status();
                let ancestor = PolicyAncestorStatus::new(
                    target.parent_ref(),
                    POLICY_ENGINE_CONTROLLER_NAME,
                    [&condition],
                    policy.metadata().generation,
                    now.clone(),
                );
                statuses
                    .entry(policy.to_string())
                    .or_insert_with(|| (policy.clone(), PolicyStatus::default()))
                    .1
                    .ancestors
                    .push(ancestor);
            }
        }
        statuses
    }

    /// Writes the policies' statuses as a multi-document YAML stream.
    pub fn write_statuses(&self, path: &Path, now: Time) -> Result<()> {
        let mut yaml = String::new();
        for (policy, status) in self.statuses(now).into_values() {
            let document = serde_json::json!({
                "apiVersion": api_version(&policy),
                "kind": policy.kind().as_str(),
                "metadata": {
                    "namespace": policy.namespace(),
                    "name": policy.name(),
                },
                "status": status,
            });
            yaml.push_str("---\n");
            yaml.push_str(&serde_yaml::to_string(&document)?);
        }
        std::fs::write(path, yaml).with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "Wrote statuses");
        Ok(())
    }
}

fn api_version(policy: &Policy) -> String {
    match policy {
        Policy::ProxySettings(_) => ProxySettingsPolicy::api_version(&()),
        Policy::RateLimit { .. } => RateLimitPolicy::api_version(&()),
        Policy::Snippets(_) => SnippetsPolicy::api_version(&()),
    }
    .into_owned()
}
