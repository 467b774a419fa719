//! API key validation utilities

use thiserror::Error;

/// Errors that can occur during raw API key validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiKeyValidationError {
    #[error("API key cannot be empty")]
    Empty,

    #[error("API key is shorter than the minimum of {0} characters")]
    TooShort(usize),

    #[error("API key exceeds maximum length of {0} characters")]
    TooLong(usize),

    #[error("API key contains invalid character: '{0}'. Only alphanumeric characters, underscores and hyphens are allowed")]
    InvalidCharacter(char),
}

pub const MIN_API_KEY_LENGTH: usize = 16;
pub const MAX_API_KEY_LENGTH: usize = 64;

/// Validate the syntax of a raw API key before any lookup
///
/// Rules:
/// - Between 16 and 64 characters
/// - Only ASCII alphanumeric characters, underscores and hyphens
pub fn validate_api_key_syntax(key: &str) -> Result<(), ApiKeyValidationError> {
    if key.is_empty() {
        return Err(ApiKeyValidationError::Empty);
    }

    if key.len() > MAX_API_KEY_LENGTH {
        return Err(ApiKeyValidationError::TooLong(MAX_API_KEY_LENGTH));
    }

    if let Some(c) = key
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(ApiKeyValidationError::InvalidCharacter(c));
    }

    if key.len() < MIN_API_KEY_LENGTH {
        return Err(ApiKeyValidationError::TooShort(MIN_API_KEY_LENGTH));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_api_keys() {
        assert!(validate_api_key_syntax("gc_abcdefghijklmnop").is_ok());
        assert!(validate_api_key_syntax(&"a".repeat(16)).is_ok());
        assert!(validate_api_key_syntax(&"Z9-_".repeat(16)).is_ok());
        assert!(validate_api_key_syntax(&"f".repeat(64)).is_ok());
    }

    #[test]
    fn test_empty_key() {
        assert_eq!(validate_api_key_syntax(""), Err(ApiKeyValidationError::Empty));
    }

    #[test]
    fn test_too_short_key() {
        assert_eq!(
            validate_api_key_syntax("short_key"),
            Err(ApiKeyValidationError::TooShort(16))
        );
    }

    #[test]
    fn test_too_long_key() {
        let long_key = "a".repeat(65);
        assert_eq!(
            validate_api_key_syntax(&long_key),
            Err(ApiKeyValidationError::TooLong(64))
        );
    }

    #[test]
    fn test_invalid_character() {
        assert_eq!(
            validate_api_key_syntax("gc_abcdefghij.klmnop"),
            Err(ApiKeyValidationError::InvalidCharacter('.'))
        );
        assert_eq!(
            validate_api_key_syntax("../../etc/passwd_xx"),
            Err(ApiKeyValidationError::InvalidCharacter('.'))
        );
        assert_eq!(
            validate_api_key_syntax("gc_abcdefgh ijklmnop"),
            Err(ApiKeyValidationError::InvalidCharacter(' '))
        );
    }
}
