//! Field-path addressed validation errors.
//!
//! Errors render the same way Kubernetes API validation errors do, so
//! messages surfaced in policy status read like the ones users already get
//! from the API server.

use std::fmt;
use thiserror::Error;

/// A path to a field in a resource, e.g. `spec.targetRefs[0].kind`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldPath(String);

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("{path}: Invalid value: {value}: {detail}")]
    Invalid {
        path: FieldPath,
        value: String,
        detail: String,
    },

    #[error("{path}: Unsupported value: {value}: supported values: {}", .supported.join(", "))]
    NotSupported {
        path: FieldPath,
        value: String,
        supported: Vec<String>,
    },
}

/// An ordered collection of field errors from one validation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

// === impl FieldPath ===

impl FieldPath {
    pub fn new(root: &str) -> Self {
        Self(root.to_string())
    }

    pub fn child(&self, name: &str) -> Self {
        Self(format!("{}.{}", self.0, name))
    }

    pub fn index(&self, idx: usize) -> Self {
        Self(format!("{}[{}]", self.0, idx))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// === impl FieldError ===

impl FieldError {
    /// The value is rendered with its `Debug` form, so strings are quoted.
    pub fn invalid(path: FieldPath, value: impl fmt::Debug, detail: impl fmt::Display) -> Self {
        Self::Invalid {
            path,
            value: format!("{value:?}"),
            detail: detail.to_string(),
        }
    }

    pub fn not_supported<S: fmt::Debug>(
        path: FieldPath,
        value: impl fmt::Debug,
        supported: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::NotSupported {
            path,
            value: format!("{value:?}"),
            supported: supported.into_iter().map(|s| format!("{s:?}")).collect(),
        }
    }
}

// === impl FieldErrors ===

impl FieldErrors {
    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Returns `Ok` if no errors were recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.0.is_empty() {
            return Ok(());
        }
        Err(self)
    }
}

impl Extend<FieldError> for FieldErrors {
    fn extend<T: IntoIterator<Item = FieldError>>(&mut self, iter: T) {
        self.0.extend(iter)
    }
}

impl From<FieldError> for FieldErrors {
    fn from(error: FieldError) -> Self {
        Self(vec![error])
    }
}

impl FromIterator<FieldError> for FieldErrors {
    fn from_iter<T: IntoIterator<Item = FieldError>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A single error renders on its own; several render as `[e1, e2]`.
/// Identical messages are only rendered once.
impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut msgs = Vec::with_capacity(self.0.len());
        for error in &self.0 {
            let msg = error.to_string();
            if !msgs.contains(&msg) {
                msgs.push(msg);
            }
        }

        match msgs.as_slice() {
            [] => Ok(()),
            [msg] => f.write_str(msg),
            msgs => write!(f, "[{}]", msgs.join(", ")),
        }
    }
}

impl std::error::Error for FieldErrors {}
