//! Content-Type validation for configured TOON media types.
//!
//! Runs at configuration time only. A value that fails here must never reach
//! a response header.

use thiserror::Error;

/// Longest allowed type or subtype token.
const MAX_TOKEN_LEN: usize = 127;

/// Reasons a configured content type is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MimeError {
    /// CR, LF, NUL or another control character (header injection attempt).
    #[error("invalid content type {0:?}: must not contain control characters or newlines")]
    ControlCharacters(String),

    /// Not an RFC 2045 `type/subtype` pair.
    #[error("invalid content type {0:?}: must be a valid MIME type such as \"text/toon\" or \"application/x-custom+json\"")]
    InvalidSyntax(String),
}

/// Validate a content type string.
///
/// The control character check runs first so injection attempts are reported
/// separately from plain syntax errors.
pub fn validate_content_type(content_type: &str) -> Result<(), MimeError> {
    if content_type.chars().any(|c| c.is_ascii_control()) {
        return Err(MimeError::ControlCharacters(content_type.to_string()));
    }

    let valid = content_type
        .split_once('/')
        .is_some_and(|(kind, subtype)| is_token(kind) && is_token(subtype));

    if valid {
        Ok(())
    } else {
        Err(MimeError::InvalidSyntax(content_type.to_string()))
    }
}

fn is_token(token: &str) -> bool {
    let mut chars = token.chars();
    let Some(first) = chars.next() else {
        return false;
    };

    token.len() <= MAX_TOKEN_LEN
        && first.is_ascii_alphanumeric()
        && chars.all(|c| c.is_ascii_alphanumeric() || "!#$&-^_+.".contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_standard_types() {
        assert!(validate_content_type("text/toon").is_ok());
        assert!(validate_content_type("application/x-custom+json").is_ok());
        assert!(validate_content_type("application/vnd.api.v1#x").is_ok());
    }

    #[test]
    fn test_rejects_header_injection() {
        let err = validate_content_type("text/toon\r\nX-Evil: injected").unwrap_err();
        assert!(matches!(err, MimeError::ControlCharacters(_)));

        assert!(matches!(
            validate_content_type("text/toon\0"),
            Err(MimeError::ControlCharacters(_))
        ));
        assert!(matches!(
            validate_content_type("text/\x7ftoon"),
            Err(MimeError::ControlCharacters(_))
        ));
    }

    #[test]
    fn test_rejects_bad_syntax() {
        for value in ["not-a-mime", "", "/toon", "text/", "text/toon/extra", "-text/toon", "text/to on"] {
            assert!(
                matches!(validate_content_type(value), Err(MimeError::InvalidSyntax(_))),
                "{value:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_token_length_limit() {
        let long = "a".repeat(MAX_TOKEN_LEN);
        assert!(validate_content_type(&format!("{long}/toon")).is_ok());

        let too_long = "a".repeat(MAX_TOKEN_LEN + 1);
        assert!(validate_content_type(&format!("{too_long}/toon")).is_err());
    }
}
