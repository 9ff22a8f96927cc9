use super::{LocalPolicyTargetReference, PolicyStatus};
use std::fmt;

/// Injects raw NGINX configuration into the contexts of targeted Gateways.
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
    kind = "SnippetsPolicy",
    status = "PolicyStatus",
    derive = "PartialEq",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct SnippetsPolicySpec {
    pub target_refs: Vec<LocalPolicyTargetReference>,
    #[serde(default)]
    pub snippets: Vec<Snippet>,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize, schemars::JsonSchema)]
pub struct Snippet {
    pub context: SnippetContext,
    pub value: String,
}

/// The NGINX block a snippet is inserted into.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Hash,
    serde::Deserialize,
    serde::Serialize,
    schemars::JsonSchema,
)]
pub enum SnippetContext {
    #[serde(rename = "main")]
    Main,
    #[serde(rename = "http")]
    Http,
    #[serde(rename = "http.server")]
    HttpServer,
    #[serde(rename = "http.server.location")]
    HttpServerLocation,
}

// === impl SnippetContext ===

impl SnippetContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Http => "http",
            Self::HttpServer => "http.server",
            Self::HttpServerLocation => "http.server.location",
        }
    }
}

impl fmt::Display for SnippetContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}
