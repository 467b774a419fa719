//! Game management admin endpoints

use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::parse_game_id;
use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::Game;
use crate::infrastructure::services::{
    CreateGameRequest, GameSummary, IssuedGameKey, UpdateGameRequest,
};

fn default_active() -> bool {
    true
}

/// Request to create a new game
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGameApiRequest {
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

/// Request to update a game
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateGameApiRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// Game response for admin API
///
/// Neither the raw key nor its hash is exposed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameResponse {
    pub id: String,
    pub name: String,
    pub active: bool,
    pub revision: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_count: Option<usize>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Game> for GameResponse {
    fn from(game: &Game) -> Self {
        Self {
            id: game.id().to_string(),
            name: game.name().to_string(),
            active: game.is_active(),
            revision: game.revision(),
            entry_count: None,
            created_at: game.created_at().to_rfc3339(),
            updated_at: game.updated_at().to_rfc3339(),
        }
    }
}

impl From<&GameSummary> for GameResponse {
    fn from(summary: &GameSummary) -> Self {
        Self {
            entry_count: Some(summary.entry_count),
            ..Self::from(&summary.game)
        }
    }
}

/// Game response with its raw API key (creation and key regeneration only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameWithKeyResponse {
    #[serde(flatten)]
    pub game: GameResponse,
    pub api_key: String,
}

impl From<IssuedGameKey> for GameWithKeyResponse {
    fn from(issued: IssuedGameKey) -> Self {
        Self {
            game: GameResponse::from(&issued.game),
            api_key: issued.api_key,
        }
    }
}

/// List games response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListGamesResponse {
    pub games: Vec<GameResponse>,
    pub total: usize,
}

/// GET /admin/games
pub async fn list_games(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<ListGamesResponse>, ApiError> {
    debug!("Admin listing all games");

    let summaries = state.admin_service.list_games().await?;
    let games: Vec<GameResponse> = summaries.iter().map(GameResponse::from).collect();
    let total = games.len();

    Ok(Json(ListGamesResponse { games, total }))
}

/// POST /admin/games
pub async fn create_game(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(request): Json<CreateGameApiRequest>,
) -> Result<Json<GameWithKeyResponse>, ApiError> {
    debug!(username = admin.username(), "Admin creating game");

    let issued = state
        .admin_service
        .create_game(CreateGameRequest {
            name: request.name,
            active: request.active,
        })
        .await?;

    Ok(Json(issued.into()))
}

/// GET /admin/games/{game_id}
pub async fn get_game(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(game_id): Path<String>,
) -> Result<Json<GameResponse>, ApiError> {
    let game_id = parse_game_id(&game_id)?;
    let game = state.admin_service.get_game(&game_id).await?;

    Ok(Json(GameResponse::from(&game)))
}

/// PUT /admin/games/{game_id}
pub async fn update_game(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(game_id): Path<String>,
    Json(request): Json<UpdateGameApiRequest>,
) -> Result<Json<GameResponse>, ApiError> {
    let game_id = parse_game_id(&game_id)?;
    debug!(username = admin.username(), game_id = %game_id, "Admin updating game");

    let game = state
        .admin_service
        .update_game(
            &game_id,
            UpdateGameRequest {
                name: request.name,
                active: request.active,
            },
        )
        .await?;

    Ok(Json(GameResponse::from(&game)))
}

/// DELETE /admin/games/{game_id}
pub async fn delete_game(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(game_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let game_id = parse_game_id(&game_id)?;
    debug!(username = admin.username(), game_id = %game_id, "Admin deleting game");

    state.admin_service.delete_game(&game_id).await?;

    Ok(Json(serde_json::json!({
        "deleted": true,
        "id": game_id.to_string()
    })))
}

/// POST /admin/games/{game_id}/regenerate-key
pub async fn regenerate_key(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(game_id): Path<String>,
) -> Result<Json<GameWithKeyResponse>, ApiError> {
    let game_id = parse_game_id(&game_id)?;
    debug!(username = admin.username(), game_id = %game_id, "Admin regenerating API key");

    let issued = state.admin_service.regenerate_key(&game_id).await?;

    Ok(Json(issued.into()))
}
