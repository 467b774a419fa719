//! Infrastructure services

mod admin_service;
mod config_service;

pub use admin_service::{
    AdminService, CreateConfigEntryRequest, CreateGameRequest, GameSummary, IssuedGameKey,
    UpdateConfigEntryRequest, UpdateGameRequest, UpsertConfigEntryRequest,
};
pub use config_service::{ConfigRequest, ConfigResponse, ConfigService};
