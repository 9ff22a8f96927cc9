use nginx_policy_engine_k8s_api::{
    policy::{
        LocalPolicyTargetReference, PolicyStatus, ProxySettingsPolicy, RateLimitPolicy,
        SnippetsPolicy,
    },
    ObjectMeta, Resource, ResourceExt, Time,
};
use std::fmt;

/// An attached policy of any supported kind.
#[derive(Clone, Debug, PartialEq)]
pub enum Policy {
    ProxySettings(ProxySettingsPolicy),
    RateLimit { policy: RateLimitPolicy, role: Role },
    Snippets(SnippetsPolicy),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PolicyKind {
    ProxySettings,
    RateLimit,
    Snippets,
}

/// Distinguishes a policy a user created from one synthesized by the engine.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Role {
    #[default]
    UserDefined,

    /// An http-scoped copy of a route-targeted RateLimitPolicy. It only
    /// declares the policy's `limit_req_zone`s, which NGINX requires in the
    /// http context.
    ZoneShadow,
}

// === impl Policy ===

impl Policy {
    /// Builds the http-scoped shadow of a route-targeted RateLimitPolicy.
    pub fn zone_shadow(policy: RateLimitPolicy) -> Self {
        Self::RateLimit {
            policy,
            role: Role::ZoneShadow,
        }
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            Self::ProxySettings(_) => PolicyKind::ProxySettings,
            Self::RateLimit { .. } => PolicyKind::RateLimit,
            Self::Snippets(_) => PolicyKind::Snippets,
        }
    }

    #[inline]
    pub fn role(&self) -> Role {
        match self {
            Self::RateLimit { role, .. } => *role,
            _ => Role::UserDefined,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Self::ProxySettings(p) => p.meta(),
            Self::RateLimit { policy, .. } => policy.meta(),
            Self::Snippets(p) => p.meta(),
        }
    }

    pub fn namespace(&self) -> String {
        self.metadata().namespace.clone().unwrap_or_default()
    }

    pub fn name(&self) -> String {
        match self {
            Self::ProxySettings(p) => p.name_any(),
            Self::RateLimit { policy, .. } => policy.name_any(),
            Self::Snippets(p) => p.name_any(),
        }
    }

    pub fn target_refs(&self) -> &[LocalPolicyTargetReference] {
        match self {
            Self::ProxySettings(p) => &p.spec.target_refs,
            Self::RateLimit { policy, .. } => &policy.spec.target_refs,
            Self::Snippets(p) => &p.spec.target_refs,
        }
    }

    pub fn status(&self) -> Option<&PolicyStatus> {
        match self {
            Self::ProxySettings(p) => p.status.as_ref(),
            Self::RateLimit { policy, .. } => policy.status.as_ref(),
            Self::Snippets(p) => p.status.as_ref(),
        }
    }

    pub fn creation_timestamp(&self) -> Option<Time> {
        self.metadata().creation_timestamp.clone()
    }
}

/// Formats the policy as `Kind namespace/name`.
impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let meta = self.metadata();
        write!(
            f,
            "{} {}/{}",
            self.kind(),
            meta.namespace.as_deref().unwrap_or_default(),
            meta.name.as_deref().unwrap_or_default(),
        )
    }
}

impl From<ProxySettingsPolicy> for Policy {
    fn from(policy: ProxySettingsPolicy) -> Self {
        Self::ProxySettings(policy)
    }
}

impl From<RateLimitPolicy> for Policy {
    fn from(policy: RateLimitPolicy) -> Self {
        Self::RateLimit {
            policy,
            role: Role::UserDefined,
        }
    }
}

impl From<SnippetsPolicy> for Policy {
    fn from(policy: SnippetsPolicy) -> Self {
        Self::Snippets(policy)
    }
}

// === impl PolicyKind ===

impl PolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProxySettings => "ProxySettingsPolicy",
            Self::RateLimit => "RateLimitPolicy",
            Self::Snippets => "SnippetsPolicy",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}
