//! Validators for values that end up inside NGINX directives.
//!
//! Most of these guard against configuration injection: a value that passes
//! can be written into an NGINX string literal or directive argument without
//! changing the structure of the surrounding configuration.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0}")]
    Regex(RegexError),

    #[error("must be no more than {max} characters")]
    TooLong { max: usize },

    #[error("unsupported header name configured, unsupported names are: {}", UNSUPPORTED_HEADERS.join(", "))]
    UnsupportedHeader,

    #[error("cannot be empty")]
    Empty,

    #[error("cannot contain $")]
    ContainsVariable,

    #[error("invalid regex for path {path:?}: {error}")]
    InvalidRegex { path: String, error: String },

    #[error("invalid regex for path {0:?}: '$' must be escaped")]
    UnescapedDollar(String),
}

/// A pattern mismatch, rendered the way Kubernetes renders `RegexError`s:
/// `<msg> (e.g. 'a' or 'b', regex used for validation is '<fmt>')`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegexError {
    msg: &'static str,
    fmt: &'static str,
    examples: &'static [&'static str],
}

const MAX_HEADER_LENGTH: usize = 256;

/// Header names that can't be rewritten without breaking proxying. Sorted.
const UNSUPPORTED_HEADERS: [&str; 3] = ["connection", "host", "upgrade"];

const PATH_FMT: &str = r"/[^\s{};]*";
const PATH_ERR_MSG: &str =
    "must start with / and must not include any whitespace character, `{`, `}` or `;`";
const PATH_EXAMPLES: &[&str] = &["/", "/path", "/path/subpath-123"];

const ESCAPED_STRING_FMT: &str = r#"([^"\\]|\\.)*"#;
const ESCAPED_STRING_ERR_MSG: &str =
    r#"must have all '"' (double quotes) escaped and must not end with an unescaped '\' (backslash)"#;

const ESCAPED_STRING_NO_VAR_FMT: &str = r#"([^"$\\]|\\[^$])*"#;
const ESCAPED_STRING_NO_VAR_ERR_MSG: &str =
    r#"a valid value must have all '"' escaped and must not contain any '$' or end with an unescaped '\'"#;

const RATE_FMT: &str = r"^\d+r/[sm]$";
const RATE_ERR_MSG: &str = "must contain a number followed by 'r/s' or 'r/m'";
const RATE_EXAMPLES: &[&str] = &["10r/s", "500r/m"];

// Either a run of characters that can't end an NGINX directive argument, or
// an NGINX variable.
const LIMIT_REQ_KEY_FMT: &str = r"^(?:[^ \t\r\n;{}#$]+|\$\w+)+$";
const LIMIT_REQ_KEY_ERR_MSG: &str = "must be a valid limit_req key consisting of nginx variables \
     and/or strings without spaces or special characters";
const LIMIT_REQ_KEY_EXAMPLES: &[&str] = &[
    "$binary_remote_addr",
    "$binary_remote_addr:$request_uri",
    "my_fixed_key",
];

const SIZE_FMT: &str = r"^\d{1,4}(k|m|g)?$";
const SIZE_ERR_MSG: &str = "must contain a number of at most 4 digits that may be followed by 'k', 'm' or 'g'";
const SIZE_EXAMPLES: &[&str] = &["1024", "8k", "1m"];

const HEADER_NAME_FMT: &str = "[-A-Za-z0-9]+";
const HEADER_NAME_ERR_MSG: &str =
    "a valid HTTP header must consist of alphanumeric characters or '-'";
const HEADER_NAME_EXAMPLES: &[&str] = &["X-Header-Name"];

pub const HOSTNAME_EXAMPLES: &[&str] = &["host", "example.com"];
pub const HEADER_VALUE_EXAMPLES: &[&str] = &["my-header-value", "example/12345=="];

macro_rules! anchored {
    ($fmt:expr) => {
        Lazy::new(|| Regex::new(&format!("^{}$", $fmt)).expect("validation regex must compile"))
    };
}

macro_rules! exact {
    ($fmt:expr) => {
        Lazy::new(|| Regex::new($fmt).expect("validation regex must compile"))
    };
}

static PATH: Lazy<Regex> = anchored!(PATH_FMT);
static ESCAPED_STRING: Lazy<Regex> = anchored!(ESCAPED_STRING_FMT);
static ESCAPED_STRING_NO_VAR: Lazy<Regex> = anchored!(ESCAPED_STRING_NO_VAR_FMT);
static HEADER_NAME: Lazy<Regex> = anchored!(HEADER_NAME_FMT);
static RATE: Lazy<Regex> = exact!(RATE_FMT);
static LIMIT_REQ_KEY: Lazy<Regex> = exact!(LIMIT_REQ_KEY_FMT);
static SIZE: Lazy<Regex> = exact!(SIZE_FMT);

// === impl RegexError ===

impl RegexError {
    pub const fn new(
        msg: &'static str,
        fmt: &'static str,
        examples: &'static [&'static str],
    ) -> Self {
        Self { msg, fmt, examples }
    }
}

impl fmt::Display for RegexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.examples.is_empty() {
            return write!(f, "{} (regex used for validation is '{}')", self.msg, self.fmt);
        }

        let examples = self
            .examples
            .iter()
            .map(|e| format!("'{e}'"))
            .collect::<Vec<_>>()
            .join(" or ");
        write!(
            f,
            "{} (e.g. {}, regex used for validation is '{}')",
            self.msg, examples, self.fmt
        )
    }
}

impl From<RegexError> for ValidationError {
    fn from(error: RegexError) -> Self {
        Self::Regex(error)
    }
}

fn check(
    regex: &Regex,
    value: &str,
    msg: &'static str,
    fmt: &'static str,
    examples: &'static [&'static str],
) -> Result<(), ValidationError> {
    if regex.is_match(value) {
        return Ok(());
    }
    Err(RegexError::new(msg, fmt, examples).into())
}

/// Validates an NGINX size such as `8k`, `16m` or `1024`.
pub fn validate_nginx_size(size: &str) -> Result<(), ValidationError> {
    check(&SIZE, size, SIZE_ERR_MSG, SIZE_FMT, SIZE_EXAMPLES)
}

/// Validates a `limit_req_zone` rate such as `10r/s`.
pub fn validate_rate(rate: &str) -> Result<(), ValidationError> {
    check(&RATE, rate, RATE_ERR_MSG, RATE_FMT, RATE_EXAMPLES)
}

/// Validates a `limit_req_zone` key.
pub fn validate_limit_req_key(key: &str) -> Result<(), ValidationError> {
    check(
        &LIMIT_REQ_KEY,
        key,
        LIMIT_REQ_KEY_ERR_MSG,
        LIMIT_REQ_KEY_FMT,
        LIMIT_REQ_KEY_EXAMPLES,
    )
}

/// Validates a value written inside `"..."` for a directive that doesn't
/// support regexes. Variables are still expanded by NGINX.
pub fn validate_escaped_string(
    value: &str,
    examples: &'static [&'static str],
) -> Result<(), ValidationError> {
    check(
        &ESCAPED_STRING,
        value,
        ESCAPED_STRING_ERR_MSG,
        ESCAPED_STRING_FMT,
        examples,
    )
}

/// Like [`validate_escaped_string`], but rejects `$` so the value is never
/// subject to variable expansion.
pub fn validate_escaped_string_no_var_expansion(
    value: &str,
    examples: &'static [&'static str],
) -> Result<(), ValidationError> {
    check(
        &ESCAPED_STRING_NO_VAR,
        value,
        ESCAPED_STRING_NO_VAR_ERR_MSG,
        ESCAPED_STRING_NO_VAR_FMT,
        examples,
    )
}

pub fn validate_hostname(hostname: &str) -> Result<(), ValidationError> {
    validate_escaped_string_no_var_expansion(hostname, HOSTNAME_EXAMPLES)
}

pub fn validate_header_value(value: &str) -> Result<(), ValidationError> {
    validate_escaped_string_no_var_expansion(value, HEADER_VALUE_EXAMPLES)
}

/// Validates a path used in a filter. An empty path is allowed.
pub fn validate_path(path: &str) -> Result<(), ValidationError> {
    if path.is_empty() {
        return Ok(());
    }
    check(&PATH, path, PATH_ERR_MSG, PATH_FMT, PATH_EXAMPLES)?;
    if path.contains('$') {
        return Err(ValidationError::ContainsVariable);
    }
    Ok(())
}

/// Validates a path used in a prefix or exact `location`.
pub fn validate_path_in_match(path: &str) -> Result<(), ValidationError> {
    if path.is_empty() {
        return Err(ValidationError::Empty);
    }
    check(&PATH, path, PATH_ERR_MSG, PATH_FMT, PATH_EXAMPLES)
}

/// Validates a path used in a regex `location`.
///
/// The pattern must compile with the `regex` crate, which rejects look-around
/// and backreferences. A `$` is only allowed when escaped, since NGINX would
/// otherwise treat it as the start of a variable.
pub fn validate_path_in_regex_match(path: &str) -> Result<(), ValidationError> {
    if path.is_empty() {
        return Err(ValidationError::Empty);
    }
    check(&PATH, path, PATH_ERR_MSG, PATH_FMT, PATH_EXAMPLES)?;

    Regex::new(path).map_err(|error| ValidationError::InvalidRegex {
        path: path.to_string(),
        error: error.to_string(),
    })?;

    let mut escaped = false;
    for c in path.chars() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '$' => return Err(ValidationError::UnescapedDollar(path.to_string())),
            _ => {}
        }
    }
    Ok(())
}

/// Validates the name of a header a filter sets or removes.
pub fn validate_header_name(name: &str) -> Result<(), ValidationError> {
    if name.len() > MAX_HEADER_LENGTH {
        return Err(ValidationError::TooLong {
            max: MAX_HEADER_LENGTH,
        });
    }
    check(
        &HEADER_NAME,
        name,
        HEADER_NAME_ERR_MSG,
        HEADER_NAME_FMT,
        HEADER_NAME_EXAMPLES,
    )?;
    if UNSUPPORTED_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
        return Err(ValidationError::UnsupportedHeader);
    }
    Ok(())
}
