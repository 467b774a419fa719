use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid API key format")]
    InvalidKeyFormat,

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Duplicate configuration key: {key}")]
    DuplicateConfigKey { key: String },

    #[error("Game not found: {message}")]
    GameNotFound { message: String },

    #[error("Configuration not found: {message}")]
    ConfigNotFound { message: String },

    #[error("Storage unavailable: {message}")]
    StorageUnavailable { message: String },

    #[error("Malformed request body: {message}")]
    MalformedRequestBody { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Cache error: {message}")]
    Cache { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DomainError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    pub fn duplicate_config_key(key: impl Into<String>) -> Self {
        Self::DuplicateConfigKey { key: key.into() }
    }

    pub fn game_not_found(message: impl Into<String>) -> Self {
        Self::GameNotFound {
            message: message.into(),
        }
    }

    pub fn config_not_found(message: impl Into<String>) -> Self {
        Self::ConfigNotFound {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageUnavailable {
            message: message.into(),
        }
    }

    pub fn malformed_body(message: impl Into<String>) -> Self {
        Self::MalformedRequestBody {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_not_found_error() {
        let error = DomainError::game_not_found("Game 'abc' not found");
        assert_eq!(error.to_string(), "Game not found: Game 'abc' not found");
    }

    #[test]
    fn test_duplicate_key_error() {
        let error = DomainError::duplicate_config_key("max_players");
        assert_eq!(
            error.to_string(),
            "Duplicate configuration key: max_players"
        );
    }
}
