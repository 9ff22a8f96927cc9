pub mod authentication_filter;
pub mod proxy_settings;
pub mod rate_limit;
pub mod snippets;
mod status;
pub mod target_ref;

pub use self::{
    authentication_filter::{
        AuthType, AuthenticationFilter, AuthenticationFilterSpec, BasicAuth, LocalObjectReference,
    },
    proxy_settings::{ProxyBuffering, ProxyBuffers, ProxySettingsPolicy, ProxySettingsPolicySpec},
    rate_limit::{
        LocalRateLimit, RateLimit, RateLimitLogLevel, RateLimitPolicy, RateLimitPolicySpec,
        RateLimitRule,
    },
    snippets::{Snippet, SnippetContext, SnippetsPolicy, SnippetsPolicySpec},
    status::{PolicyAncestorStatus, PolicyStatus},
    target_ref::{LocalPolicyTargetReference, TargetKind, GATEWAY_API_GROUP},
};

pub const API_GROUP: &str = "gateway.nginx.org";
