//! Admin login and logout endpoints

use axum::{extract::State, http::HeaderMap};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::middleware::{bearer_token, ClientId, RequireAdmin};
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::DomainError;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Issued session; the token is shown only in this response
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub expires_at: String,
}

/// POST /admin/login
pub async fn login(
    State(state): State<AppState>,
    ClientId(client_id): ClientId,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let issued = state
        .session_service
        .login(&request.username, &request.password, &client_id)
        .await
        .map_err(|e| match e {
            DomainError::Unauthorized { .. } => ApiError::unauthorized("Invalid credentials"),
            other => other.into(),
        })?;

    Ok(Json(LoginResponse {
        username: issued.session.username().to_string(),
        expires_at: issued.session.expires_at().to_rfc3339(),
        token: issued.token,
    }))
}

/// POST /admin/logout
pub async fn logout(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    debug!(username = admin.username(), "Admin logging out");

    let token = bearer_token(&headers).unwrap_or_default();
    let revoked = state.session_service.logout(token).await?;

    Ok(Json(serde_json::json!({ "logged_out": revoked })))
}
