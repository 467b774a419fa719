//! Configuration entry admin endpoints

use axum::extract::{Path, State};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{parse_config_id, parse_game_id};
use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::config_entry::decode_value;
use crate::domain::ConfigEntry;
use crate::infrastructure::services::{
    CreateConfigEntryRequest, UpdateConfigEntryRequest, UpsertConfigEntryRequest,
};

fn default_active() -> bool {
    true
}

/// Distinguishes an explicit `null` from an absent field
fn deserialize_some<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Request to create a configuration entry
///
/// `value` is any JSON value; strings are stored verbatim.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateConfigApiRequest {
    pub key: String,
    pub value: Value,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// Request to set a key's value
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertConfigApiRequest {
    pub value: Value,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// Request to update a configuration entry
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateConfigApiRequest {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    /// `null` clears the description
    #[serde(default, deserialize_with = "deserialize_some")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// Configuration entry response for admin API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigEntryResponse {
    pub id: String,
    pub game_id: String,
    pub key: String,
    /// Stored value as served to clients
    pub value: Value,
    /// Stored value exactly as persisted
    pub raw_value: String,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&ConfigEntry> for ConfigEntryResponse {
    fn from(entry: &ConfigEntry) -> Self {
        Self {
            id: entry.id().to_string(),
            game_id: entry.game_id().to_string(),
            key: entry.key().to_string(),
            value: decode_value(entry.value()),
            raw_value: entry.value().to_string(),
            description: entry.description().map(String::from),
            active: entry.is_active(),
            created_at: entry.created_at().to_rfc3339(),
            updated_at: entry.updated_at().to_rfc3339(),
        }
    }
}

/// List configuration entries response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConfigsResponse {
    pub configs: Vec<ConfigEntryResponse>,
    pub total: usize,
}

/// Upsert response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertConfigResponse {
    #[serde(flatten)]
    pub config: ConfigEntryResponse,
    pub created: bool,
}

/// GET /admin/games/{game_id}/configs
pub async fn list_configs(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(game_id): Path<String>,
) -> Result<Json<ListConfigsResponse>, ApiError> {
    let game_id = parse_game_id(&game_id)?;
    debug!(game_id = %game_id, "Admin listing config entries");

    let entries = state.admin_service.list_config_entries(&game_id).await?;
    let configs: Vec<ConfigEntryResponse> = entries.iter().map(ConfigEntryResponse::from).collect();
    let total = configs.len();

    Ok(Json(ListConfigsResponse { configs, total }))
}

/// POST /admin/games/{game_id}/configs
pub async fn create_config(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(game_id): Path<String>,
    Json(request): Json<CreateConfigApiRequest>,
) -> Result<Json<ConfigEntryResponse>, ApiError> {
    let game_id = parse_game_id(&game_id)?;
    debug!(username = admin.username(), game_id = %game_id, key = %request.key, "Admin creating config entry");

    let entry = state
        .admin_service
        .create_config_entry(
            &game_id,
            CreateConfigEntryRequest {
                key: request.key,
                value: request.value,
                description: request.description,
                active: request.active,
            },
        )
        .await?;

    Ok(Json(ConfigEntryResponse::from(&entry)))
}

/// PUT /admin/games/{game_id}/configs/{key}
pub async fn upsert_config(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path((game_id, key)): Path<(String, String)>,
    Json(request): Json<UpsertConfigApiRequest>,
) -> Result<Json<UpsertConfigResponse>, ApiError> {
    let game_id = parse_game_id(&game_id)?;
    debug!(username = admin.username(), game_id = %game_id, key = %key, "Admin upserting config entry");

    let (entry, created) = state
        .admin_service
        .upsert_config_entry(
            &game_id,
            &key,
            UpsertConfigEntryRequest {
                value: request.value,
                description: request.description,
                active: request.active,
            },
        )
        .await?;

    Ok(Json(UpsertConfigResponse {
        config: ConfigEntryResponse::from(&entry),
        created,
    }))
}

/// GET /admin/configs/{config_id}
pub async fn get_config(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(config_id): Path<String>,
) -> Result<Json<ConfigEntryResponse>, ApiError> {
    let config_id = parse_config_id(&config_id)?;
    let entry = state.admin_service.get_config_entry(&config_id).await?;

    Ok(Json(ConfigEntryResponse::from(&entry)))
}

/// PUT /admin/configs/{config_id}
pub async fn update_config(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(config_id): Path<String>,
    Json(request): Json<UpdateConfigApiRequest>,
) -> Result<Json<ConfigEntryResponse>, ApiError> {
    let config_id = parse_config_id(&config_id)?;
    debug!(username = admin.username(), config_id = %config_id, "Admin updating config entry");

    let entry = state
        .admin_service
        .update_config_entry(
            &config_id,
            UpdateConfigEntryRequest {
                key: request.key,
                value: request.value,
                description: request.description,
                active: request.active,
            },
        )
        .await?;

    Ok(Json(ConfigEntryResponse::from(&entry)))
}

/// DELETE /admin/configs/{config_id}
pub async fn delete_config(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(config_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let config_id = parse_config_id(&config_id)?;
    debug!(username = admin.username(), config_id = %config_id, "Admin deleting config entry");

    state.admin_service.delete_config_entry(&config_id).await?;

    Ok(Json(serde_json::json!({
        "deleted": true,
        "id": config_id.to_string()
    })))
}
