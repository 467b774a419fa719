//! Game domain
//!
//! Games are the tenants of the service. The [`ConfigStore`] trait is the
//! persistent source of truth for games and their configuration entries.

mod entity;
mod repository;

pub use entity::{Game, GameId, GameUpdate, KeyRotation, NewGame};
pub use repository::ConfigStore;
