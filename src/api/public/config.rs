//! Configuration retrieval endpoints

use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::middleware::ClientId;
use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::{ConfigKey, DomainError, RateLimitResult};
use crate::infrastructure::services::{ConfigRequest, ConfigResponse};

pub const API_KEY_HEADER: &str = "x-api-key";

const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Query parameters accepted by the config endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigQuery {
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Optional JSON body of `POST /config`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigBody {
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Successful configuration response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigResponseBody {
    pub success: bool,
    pub config: BTreeMap<String, Value>,
}

/// GET /config
pub async fn get_config(
    State(state): State<AppState>,
    ClientId(client_id): ClientId,
    headers: HeaderMap,
    query: Result<Query<ConfigQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let query = parse_query(query)?;
    let raw_key = select_api_key(&headers, query.api_key, None);

    fetch(&state, client_id, raw_key, None).await
}

/// POST /config
///
/// The body is optional; when present it must be a JSON object.
pub async fn post_config(
    State(state): State<AppState>,
    ClientId(client_id): ClientId,
    headers: HeaderMap,
    query: Result<Query<ConfigQuery>, QueryRejection>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let query = parse_query(query)?;
    let body = parse_body(&body)?;
    let raw_key = select_api_key(&headers, query.api_key, body.api_key);

    fetch(&state, client_id, raw_key, None).await
}

/// GET /config/{key}
pub async fn get_config_key(
    State(state): State<AppState>,
    ClientId(client_id): ClientId,
    headers: HeaderMap,
    Path(key): Path<String>,
    query: Result<Query<ConfigQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let query = parse_query(query)?;
    let key = ConfigKey::new(key).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let raw_key = select_api_key(&headers, query.api_key, None);

    fetch(&state, client_id, raw_key, Some(key)).await
}

async fn fetch(
    state: &AppState,
    client_id: String,
    raw_key: Option<String>,
    only_key: Option<ConfigKey>,
) -> Result<Response, ApiError> {
    let ConfigResponse { config, rate_limit } = state
        .config_service
        .fetch(ConfigRequest {
            client_id,
            raw_key,
            only_key,
        })
        .await?;

    let mut response = Json(ConfigResponseBody {
        success: true,
        config,
    })
    .into_response();

    insert_rate_limit_headers(response.headers_mut(), &rate_limit);
    Ok(response)
}

/// Header first, then query string, then body
fn select_api_key(
    headers: &HeaderMap,
    from_query: Option<String>,
    from_body: Option<String>,
) -> Option<String> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .or_else(|| from_query.filter(|k| !k.is_empty()))
        .or_else(|| from_body.filter(|k| !k.is_empty()))
}

fn parse_query(query: Result<Query<ConfigQuery>, QueryRejection>) -> Result<ConfigQuery, ApiError> {
    query
        .map(|Query(q)| q)
        .map_err(|e| DomainError::malformed_body(e.body_text()).into())
}

fn parse_body(body: &[u8]) -> Result<ConfigBody, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ConfigBody::default());
    }

    serde_json::from_slice(body)
        .map_err(|e| DomainError::malformed_body(format!("Invalid JSON body: {}", e)).into())
}

fn insert_rate_limit_headers(headers: &mut HeaderMap, rate_limit: &RateLimitResult) {
    headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(rate_limit.limit));
    headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(rate_limit.remaining));
    headers.insert(RATE_LIMIT_RESET, HeaderValue::from(rate_limit.reset_in_seconds));
}
