use crate::Policy;
use nginx_policy_engine_core::{Condition, FieldError, FieldPath};
use nginx_policy_engine_k8s_api::policy::{LocalPolicyTargetReference, TargetKind, GATEWAY_API_GROUP};
use nginx_policy_engine_k8s_resolver::ResourceResolver;
use std::sync::Arc;

/// Validates resources of type `T`.
///
/// An empty list of conditions means the resource is accepted.
pub trait Validate<T> {
    fn validate(&self, resource: &T) -> Vec<Condition>;

    /// Checks the resource against settings that apply to the whole data
    /// plane.
    fn validate_global_settings(&self, _resource: &T, _globals: &GlobalSettings) -> Vec<Condition> {
        Vec::new()
    }

    /// Returns true if both resources set something that can only be set
    /// once for a given target.
    fn conflicts(&self, a: &T, b: &T) -> bool;
}

/// Settings derived from the NginxProxy resource that policies may depend on.
///
/// None of the current policy kinds reads these settings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlobalSettings {
    pub nginx_proxy_valid: bool,
    pub telemetry_enabled: bool,
}

#[derive(Clone, Debug, Default)]
pub struct Validator {
    pub(crate) resolver: Arc<ResourceResolver>,
}

// === impl Validator ===

impl Validator {
    pub fn new(resolver: Arc<ResourceResolver>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &Arc<ResourceResolver> {
        &self.resolver
    }
}

impl Validate<Policy> for Validator {
    fn validate(&self, policy: &Policy) -> Vec<Condition> {
        match policy {
            Policy::ProxySettings(p) => self.validate(p),
            Policy::RateLimit { policy, .. } => self.validate(policy),
            Policy::Snippets(p) => self.validate(p),
        }
    }

    fn validate_global_settings(&self, policy: &Policy, globals: &GlobalSettings) -> Vec<Condition> {
        match policy {
            Policy::ProxySettings(p) => self.validate_global_settings(p, globals),
            Policy::RateLimit { policy, .. } => self.validate_global_settings(policy, globals),
            Policy::Snippets(p) => self.validate_global_settings(p, globals),
        }
    }

    /// Policies of different kinds never conflict.
    fn conflicts(&self, a: &Policy, b: &Policy) -> bool {
        match (a, b) {
            (Policy::ProxySettings(a), Policy::ProxySettings(b)) => self.conflicts(a, b),
            (Policy::RateLimit { policy: a, .. }, Policy::RateLimit { policy: b, .. }) => {
                self.conflicts(a, b)
            }
            (Policy::Snippets(a), Policy::Snippets(b)) => self.conflicts(a, b),
            _ => false,
        }
    }
}

/// Checks that a target reference names one of the `supported` Gateway API
/// kinds. The group is checked before the kind.
pub(crate) fn validate_target_ref(
    path: FieldPath,
    target_ref: &LocalPolicyTargetReference,
    supported: &[TargetKind],
) -> Result<(), FieldError> {
    if target_ref.group != GATEWAY_API_GROUP {
        return Err(FieldError::not_supported(
            path.child("group"),
            &target_ref.group,
            [GATEWAY_API_GROUP],
        ));
    }

    match target_ref.target_kind() {
        Some(kind) if supported.contains(&kind) => Ok(()),
        _ => Err(FieldError::not_supported(
            path.child("kind"),
            &target_ref.kind,
            supported.iter().map(|k| k.as_str()),
        )),
    }
}
