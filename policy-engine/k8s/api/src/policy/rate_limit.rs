use super::{LocalPolicyTargetReference, PolicyStatus};
use crate::{Rate, Size};
use std::fmt;

#[derive(
    Clone,
    Debug,
    Default,
    PartialEq,
    kube::CustomResource,
    serde::Deserialize,
    serde::Serialize,
    schemars::JsonSchema,
)]
#[kube(
    group = "gateway.nginx.org",
    version = "v1alpha1",
    kind = "RateLimitPolicy",
    status = "PolicyStatus",
    derive = "PartialEq",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitPolicySpec {
    pub target_refs: Vec<LocalPolicyTargetReference>,
    pub rate_limit: Option<RateLimit>,
}

#[derive(
    Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize, schemars::JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub struct RateLimit {
    pub local: Option<LocalRateLimit>,
    pub dry_run: Option<bool>,
    pub log_level: Option<RateLimitLogLevel>,
    pub reject_code: Option<i32>,
}

#[derive(
    Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize, schemars::JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub struct LocalRateLimit {
    #[serde(default)]
    pub rules: Vec<RateLimitRule>,
}

/// A single `limit_req_zone`/`limit_req` pair.
///
/// Unset (or empty) `rate` and `key` values fall back to defaults when
/// rendered.
#[derive(
    Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize, schemars::JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitRule {
    pub zone_size: Option<Size>,
    pub delay: Option<i32>,
    pub no_delay: Option<bool>,
    pub burst: Option<i32>,
    pub rate: Option<Rate>,
    pub key: Option<String>,
}

#[derive(
    Copy, Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize, schemars::JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitLogLevel {
    Info,
    Notice,
    Warn,
    Error,
}

// === impl RateLimitLogLevel ===

impl RateLimitLogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Notice => "notice",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for RateLimitLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}
