//! Admin API endpoints for managing games and their configuration

pub mod configs;
pub mod games;
pub mod session;

use axum::{
    routing::{get, post, put},
    Router,
};
use uuid::Uuid;

use super::state::AppState;
use super::types::ApiError;
use crate::domain::{ConfigEntryId, GameId};

/// Create admin API router
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        // Sessions
        .route("/login", post(session::login))
        .route("/logout", post(session::logout))
        // Game management
        .route("/games", get(games::list_games).post(games::create_game))
        .route(
            "/games/{game_id}",
            get(games::get_game)
                .put(games::update_game)
                .delete(games::delete_game),
        )
        .route("/games/{game_id}/regenerate-key", post(games::regenerate_key))
        // Configuration entries
        .route(
            "/games/{game_id}/configs",
            get(configs::list_configs).post(configs::create_config),
        )
        .route("/games/{game_id}/configs/{key}", put(configs::upsert_config))
        .route(
            "/configs/{config_id}",
            get(configs::get_config)
                .put(configs::update_config)
                .delete(configs::delete_config),
        )
}

pub(crate) fn parse_game_id(id: &str) -> Result<GameId, ApiError> {
    Uuid::parse_str(id)
        .map(GameId::from_uuid)
        .map_err(|_| ApiError::bad_request(format!("Invalid game id '{}'", id)))
}

pub(crate) fn parse_config_id(id: &str) -> Result<ConfigEntryId, ApiError> {
    Uuid::parse_str(id)
        .map(ConfigEntryId::from_uuid)
        .map_err(|_| ApiError::bad_request(format!("Invalid config id '{}'", id)))
}
