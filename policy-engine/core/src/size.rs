use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SizeError {
    #[error("size must not be empty")]
    Empty,

    #[error("invalid size {0:?}: expected a number optionally followed by 'k', 'm' or 'g'")]
    Invalid(String),

    #[error("size {0:?} overflows")]
    Overflow(String),
}

const KIB: i64 = 1024;

/// Parses an NGINX size (`8k`, `16m`, `1g`, or plain bytes) into bytes.
///
/// Input is trimmed and lower-cased first, so `" 16K "` is accepted.
pub fn parse_nginx_size(size: &str) -> Result<i64, SizeError> {
    let size = size.trim().to_lowercase();
    if size.is_empty() {
        return Err(SizeError::Empty);
    }

    let (number, multiplier) = if let Some(n) = size.strip_suffix('k') {
        (n, KIB)
    } else if let Some(n) = size.strip_suffix('m') {
        (n, KIB * KIB)
    } else if let Some(n) = size.strip_suffix('g') {
        (n, KIB * KIB * KIB)
    } else {
        (size.as_str(), 1)
    };

    let number = number
        .parse::<i64>()
        .map_err(|_| SizeError::Invalid(size.clone()))?;
    number
        .checked_mul(multiplier)
        .ok_or_else(|| SizeError::Overflow(size.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units() {
        for n in [0_i64, 1, 8, 16, 512, 9999] {
            assert_eq!(parse_nginx_size(&n.to_string()), Ok(n));
            assert_eq!(parse_nginx_size(&format!("{n}k")), Ok(n * 1024));
            assert_eq!(parse_nginx_size(&format!("{n}m")), Ok(n * 1024 * 1024));
            assert_eq!(
                parse_nginx_size(&format!("{n}g")),
                Ok(n * 1024 * 1024 * 1024)
            );
        }
    }

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(parse_nginx_size("  16K "), Ok(16 * 1024));
        assert_eq!(parse_nginx_size("1G"), Ok(1024 * 1024 * 1024));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_nginx_size(""), Err(SizeError::Empty));
        assert_eq!(parse_nginx_size("   "), Err(SizeError::Empty));
        for input in ["k", "abc", "8kb", "1.5m", "8 k", "-", "8t"] {
            assert!(
                matches!(parse_nginx_size(input), Err(SizeError::Invalid(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn overflow() {
        assert!(matches!(
            parse_nginx_size("9223372036854775807g"),
            Err(SizeError::Overflow(_))
        ));
    }
}
