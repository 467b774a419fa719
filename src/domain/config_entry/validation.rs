//! Configuration entry validation utilities

use serde::Deserialize;
use thiserror::Error;

use super::value::{decode_value, value_size};
use crate::domain::DomainError;

/// Errors that can occur during configuration key validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigKeyValidationError {
    #[error("Configuration key cannot be empty")]
    Empty,

    #[error("Configuration key exceeds maximum length of {0} characters")]
    TooLong(usize),

    #[error("Configuration key contains invalid character: '{0}'. Only alphanumeric characters, dots, underscores and hyphens are allowed")]
    InvalidCharacter(char),
}

pub const MAX_CONFIG_KEY_LENGTH: usize = 255;

/// Validate a configuration key
///
/// Rules:
/// - Cannot be empty
/// - Maximum 255 characters
/// - Only `[A-Za-z0-9_.-]`
pub fn validate_config_key(key: &str) -> Result<(), ConfigKeyValidationError> {
    if key.is_empty() {
        return Err(ConfigKeyValidationError::Empty);
    }

    if key.len() > MAX_CONFIG_KEY_LENGTH {
        return Err(ConfigKeyValidationError::TooLong(MAX_CONFIG_KEY_LENGTH));
    }

    match key
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
    {
        Some(c) => Err(ConfigKeyValidationError::InvalidCharacter(c)),
        None => Ok(()),
    }
}

/// Size and length bounds applied to admin input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValidationLimits {
    /// Maximum size of a stored configuration value, in bytes
    pub max_value_bytes: usize,
    pub max_game_name_len: usize,
    pub max_description_len: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            max_value_bytes: 10_000,
            max_game_name_len: 100,
            max_description_len: 1000,
        }
    }
}

impl ValidationLimits {
    /// Check a raw stored value against the size bound
    ///
    /// The value served back after decoding must fit as well, so anything
    /// accepted here passes the same bound on read.
    pub fn validate_value(&self, value: &str) -> Result<(), DomainError> {
        let size = value.len().max(value_size(&decode_value(value)));

        if size > self.max_value_bytes {
            return Err(DomainError::validation(format!(
                "Configuration value exceeds maximum size of {} bytes",
                self.max_value_bytes
            )));
        }

        Ok(())
    }

    /// Trim and validate a game name
    pub fn validate_game_name(&self, name: &str) -> Result<String, DomainError> {
        let name = name.trim();

        if name.is_empty() {
            return Err(DomainError::validation("Game name cannot be empty"));
        }

        if name.chars().count() > self.max_game_name_len {
            return Err(DomainError::validation(format!(
                "Game name exceeds maximum length of {} characters",
                self.max_game_name_len
            )));
        }

        Ok(name.to_string())
    }

    /// Trim and validate an optional description; blank becomes `None`
    pub fn validate_description(
        &self,
        description: Option<&str>,
    ) -> Result<Option<String>, DomainError> {
        let Some(description) = description.map(str::trim).filter(|d| !d.is_empty()) else {
            return Ok(None);
        };

        if description.chars().count() > self.max_description_len {
            return Err(DomainError::validation(format!(
                "Description exceeds maximum length of {} characters",
                self.max_description_len
            )));
        }

        Ok(Some(description.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config_keys() {
        assert!(validate_config_key("max_players").is_ok());
        assert!(validate_config_key("ui.theme-color").is_ok());
        assert!(validate_config_key("A1").is_ok());
        assert!(validate_config_key(&"k".repeat(255)).is_ok());
    }

    #[test]
    fn test_invalid_config_keys() {
        assert_eq!(validate_config_key(""), Err(ConfigKeyValidationError::Empty));
        assert_eq!(
            validate_config_key(&"k".repeat(256)),
            Err(ConfigKeyValidationError::TooLong(255))
        );
        assert_eq!(
            validate_config_key("bad/key"),
            Err(ConfigKeyValidationError::InvalidCharacter('/'))
        );
    }

    #[test]
    fn test_value_size_limit() {
        let limits = ValidationLimits::default();

        assert!(limits.validate_value(&"x".repeat(10_000)).is_ok());
        assert!(limits.validate_value(&"\n".repeat(10_000)).is_ok());
        assert!(limits.validate_value(&"\"".repeat(10_000)).is_ok());
        assert!(matches!(
            limits.validate_value(&"x".repeat(10_001)),
            Err(DomainError::Validation { .. })
        ));
    }

    #[test]
    fn test_value_size_limit_covers_decoded_form() {
        let limits = ValidationLimits {
            max_value_bytes: 7,
            ..Default::default()
        };

        assert!(limits.validate_value("100000").is_ok());
        // Five bytes stored, but served back as 100000.0
        assert!(limits.validate_value("1.0e5").is_err());
    }

    #[test]
    fn test_game_name_trimmed() {
        let limits = ValidationLimits::default();

        assert_eq!(limits.validate_game_name("  Racer  ").unwrap(), "Racer");
        assert!(limits.validate_game_name("   ").is_err());
        assert!(limits.validate_game_name(&"n".repeat(101)).is_err());
    }

    #[test]
    fn test_description_blank_is_none() {
        let limits = ValidationLimits::default();

        assert_eq!(limits.validate_description(Some("  ")).unwrap(), None);
        assert_eq!(limits.validate_description(None).unwrap(), None);
        assert_eq!(
            limits.validate_description(Some(" Lobby size ")).unwrap(),
            Some("Lobby size".to_string())
        );
        assert!(limits.validate_description(Some(&"d".repeat(1001))).is_err());
    }
}
