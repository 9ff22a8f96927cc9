#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod condition;
pub mod field;
pub mod size;
pub mod validation;

pub use self::{
    condition::{Condition, ConditionReason, ConditionStatus, ConditionType},
    field::{FieldError, FieldErrors, FieldPath},
    size::{parse_nginx_size, SizeError},
    validation::{RegexError, ValidationError},
};

pub const POLICY_ENGINE_CONTROLLER_NAME: &str = "gateway.nginx.org/policy-engine";

/// An NGINX configuration scope that policy directives can be rendered into.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NginxContext {
    Main,
    Http,
    Server,
    Location,
    /// A location only reachable through an internal redirect.
    InternalLocation,
}

/// A named NGINX configuration fragment.
///
/// Names are derived from the policy kind, namespace, and name, so rendering
/// the same policy twice always produces the same file name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeneratedFile {
    pub name: String,
    pub content: String,
}

// === impl NginxContext ===

impl NginxContext {
    pub const ALL: [Self; 5] = [
        Self::Main,
        Self::Http,
        Self::Server,
        Self::Location,
        Self::InternalLocation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Http => "http",
            Self::Server => "server",
            Self::Location => "location",
            Self::InternalLocation => "internal-location",
        }
    }
}

impl std::fmt::Display for NginxContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_str().fmt(f)
    }
}

// === impl GeneratedFile ===

impl GeneratedFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}
