use nginx_policy_engine_core::{parse_nginx_size, SizeError};
use std::fmt;

/// An NGINX size such as `8k`, `16m` or `1024`.
///
/// The value is kept as written; it is only interpreted when it's validated
/// or compared against other sizes.
#[derive(
    Clone, Debug, Eq, PartialEq, Hash, serde::Deserialize, serde::Serialize, schemars::JsonSchema,
)]
#[serde(transparent)]
pub struct Size(pub String);

/// A request rate such as `10r/s` or `500r/m`.
#[derive(
    Clone, Debug, Eq, PartialEq, Hash, serde::Deserialize, serde::Serialize, schemars::JsonSchema,
)]
#[serde(transparent)]
pub struct Rate(pub String);

// === impl Size ===

impl Size {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn bytes(&self) -> Result<i64, SizeError> {
        parse_nginx_size(&self.0)
    }
}

impl From<&str> for Size {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// === impl Rate ===

impl Rate {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Rate {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
