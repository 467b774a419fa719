//! JSON error responses

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::domain::DomainError;

/// Error body returned by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
    /// Stable machine-readable code
    pub code: String,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
    /// Seconds until a rate limited client may retry
    pub retry_after: Option<u64>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                error: message.into(),
                code: code.into(),
            },
            retry_after: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
    }

    pub fn malformed_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "malformed_request", message)
    }

    /// The single response for malformed, unknown, inactive and revoked keys
    pub fn invalid_api_key() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "invalid_api_key", "Invalid API key")
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "duplicate_config_key", message)
    }

    pub fn rate_limited(retry_after: u64) -> Self {
        let mut err = Self::new(StatusCode::TOO_MANY_REQUESTS, "rate_limited", "Rate limit exceeded");
        err.retry_after = Some(retry_after);
        err
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal server error",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.response)).into_response();

        if let Some(secs) = self.retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }

        response
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match &err {
            DomainError::InvalidKeyFormat | DomainError::Unauthorized { .. } => {
                Self::invalid_api_key()
            }
            DomainError::RateLimited { retry_after_secs } => Self::rate_limited(*retry_after_secs),
            DomainError::DuplicateConfigKey { .. } => Self::conflict(err.to_string()),
            DomainError::GameNotFound { message } => Self::not_found("game_not_found", message),
            DomainError::ConfigNotFound { message } => {
                Self::not_found("config_not_found", message)
            }
            DomainError::MalformedRequestBody { message } => Self::malformed_request(message),
            DomainError::Validation { message } => Self::bad_request(message),
            DomainError::StorageUnavailable { .. }
            | DomainError::Cache { .. }
            | DomainError::Internal { .. } => {
                error!(error = %err, "Request failed");
                Self::internal()
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.response.code, self.response.error)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_and_unknown_keys_are_indistinguishable() {
        let malformed: ApiError = DomainError::InvalidKeyFormat.into();
        let unknown: ApiError = DomainError::unauthorized("Unknown API key").into();

        assert_eq!(malformed.status, StatusCode::UNAUTHORIZED);
        assert_eq!(malformed.status, unknown.status);
        assert_eq!(
            serde_json::to_string(&malformed.response).unwrap(),
            serde_json::to_string(&unknown.response).unwrap()
        );
    }

    #[test]
    fn test_infrastructure_errors_are_opaque() {
        let err: ApiError = DomainError::storage("connection refused to 10.0.0.5:5432").into();

        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.response.error, "Internal server error");
        assert!(!serde_json::to_string(&err.response).unwrap().contains("5432"));

        let err: ApiError = DomainError::cache("/var/cache/abc.json: disk full").into();
        assert_eq!(err.response.code, "internal_error");
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = ApiError::from(DomainError::rate_limited(42)).into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }

    #[test]
    fn test_status_mapping() {
        let status = |e: DomainError| ApiError::from(e).status;

        assert_eq!(status(DomainError::duplicate_config_key("k")), StatusCode::CONFLICT);
        assert_eq!(status(DomainError::game_not_found("g")), StatusCode::NOT_FOUND);
        assert_eq!(status(DomainError::config_not_found("c")), StatusCode::NOT_FOUND);
        assert_eq!(status(DomainError::malformed_body("b")), StatusCode::BAD_REQUEST);
        assert_eq!(status(DomainError::validation("v")), StatusCode::BAD_REQUEST);
        assert_eq!(status(DomainError::internal("i")), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
