//! Public configuration API for game clients

pub mod config;

use axum::{routing::get, Router};

use super::state::AppState;

/// Create the public router
pub fn create_public_router() -> Router<AppState> {
    Router::new()
        .route("/config", get(config::get_config).post(config::post_config))
        .route("/config/{key}", get(config::get_config_key))
}
