use super::{LocalPolicyTargetReference, PolicyStatus};
use crate::Size;

/// Configures how NGINX proxies requests to upstreams for the targeted
/// Gateways and routes.
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
    kind = "ProxySettingsPolicy",
    status = "PolicyStatus",
    derive = "PartialEq",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct ProxySettingsPolicySpec {
    pub target_refs: Vec<LocalPolicyTargetReference>,
    pub buffering: Option<ProxyBuffering>,
}

#[derive(
    Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize, schemars::JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub struct ProxyBuffering {
    pub disable: Option<bool>,
    pub buffer_size: Option<Size>,
    pub buffers: Option<ProxyBuffers>,
    pub busy_buffers_size: Option<Size>,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProxyBuffers {
    pub number: i32,
    pub size: Size,
}
