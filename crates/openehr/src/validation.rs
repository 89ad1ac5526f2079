//! Input validation utilities.
//!
//! This module contains the checks applied to caller-supplied values before they are bound
//! into AQL text.

use crate::{OpenEhrError, OpenEhrResult};

/// Upper bound on any single value bound into a query.
const MAX_LITERAL_LEN: usize = 1024;

/// Validates that a value is safe to render as an AQL string literal.
///
/// Escaping already neutralises quotes and backslashes. This additionally:
/// - Bounds the length to avoid pathological inputs
/// - Rejects control characters, which have no meaning in identifiers or namespaces
///
/// # Errors
///
/// Returns `OpenEhrError::InvalidInput` if the value is too long or contains control
/// characters.
pub fn validate_literal_value(value: &str) -> OpenEhrResult<()> {
    if value.len() > MAX_LITERAL_LEN {
        return Err(OpenEhrError::InvalidInput(format!(
            "value exceeds maximum length of {} bytes",
            MAX_LITERAL_LEN
        )));
    }

    if value.chars().any(char::is_control) {
        return Err(OpenEhrError::InvalidInput(
            "value must not contain control characters".into(),
        ));
    }

    Ok(())
}

/// Validates an opaque identifier token such as a composite resource id.
///
/// Identifiers must be non-empty, at most [`MAX_LITERAL_LEN`] bytes, and must not contain
/// whitespace or control characters.
///
/// # Errors
///
/// Returns `OpenEhrError::MalformedIdentifier` describing the first failed check.
pub fn validate_identifier_token(value: &str) -> OpenEhrResult<()> {
    if value.is_empty() {
        return Err(OpenEhrError::MalformedIdentifier(
            "identifier cannot be empty".into(),
        ));
    }

    if value.len() > MAX_LITERAL_LEN {
        return Err(OpenEhrError::MalformedIdentifier(format!(
            "identifier exceeds maximum length of {} bytes",
            MAX_LITERAL_LEN
        )));
    }

    if value.chars().any(char::is_whitespace) {
        return Err(OpenEhrError::MalformedIdentifier(
            "identifier must not contain whitespace".into(),
        ));
    }

    if value.chars().any(char::is_control) {
        return Err(OpenEhrError::MalformedIdentifier(
            "identifier must not contain control characters".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_literal_value_accepts_ordinary_values() {
        assert!(validate_literal_value("9434765919").is_ok());
        assert!(validate_literal_value("uk.nhs.nhs_number").is_ok());
        assert!(validate_literal_value("with space and 'quote'").is_ok());
        assert!(validate_literal_value("").is_ok());
    }

    #[test]
    fn test_validate_literal_value_rejects_too_long_value() {
        let long_value = "a".repeat(1025);
        let err = validate_literal_value(&long_value).expect_err("should reject too long");
        assert!(
            matches!(err, OpenEhrError::InvalidInput(msg) if msg.contains("exceeds maximum length"))
        );
    }

    #[test]
    fn test_validate_literal_value_rejects_control_characters() {
        let err = validate_literal_value("abc\u{0}").expect_err("should reject NUL");
        assert!(matches!(err, OpenEhrError::InvalidInput(msg) if msg.contains("control")));
    }

    #[test]
    fn test_validate_identifier_token_rejects_empty() {
        let err = validate_identifier_token("").expect_err("should reject empty");
        assert!(matches!(err, OpenEhrError::MalformedIdentifier(msg) if msg.contains("empty")));
    }

    #[test]
    fn test_validate_identifier_token_rejects_too_long() {
        assert!(validate_identifier_token(&"a".repeat(1024)).is_ok());

        let err = validate_identifier_token(&"a".repeat(1025)).expect_err("should reject too long");
        assert!(
            matches!(err, OpenEhrError::MalformedIdentifier(msg) if msg.contains("maximum length"))
        );
    }

    #[test]
    fn test_validate_identifier_token_rejects_whitespace() {
        for input in ["abc 123", " abc", "abc\t", "abc\n"] {
            let err = validate_identifier_token(input).expect_err("should reject whitespace");
            assert!(
                matches!(err, OpenEhrError::MalformedIdentifier(msg) if msg.contains("whitespace"))
            );
        }
    }

    #[test]
    fn test_validate_identifier_token_rejects_non_whitespace_control() {
        let err = validate_identifier_token("abc\u{7f}").expect_err("should reject DEL");
        assert!(matches!(err, OpenEhrError::MalformedIdentifier(msg) if msg.contains("control")));
    }
}
