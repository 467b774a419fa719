//! Config store trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{Game, GameId, GameUpdate, KeyRotation, NewGame};
use crate::domain::api_key::KeyHash;
use crate::domain::config_entry::{ConfigEntry, ConfigEntryId, ConfigEntryUpdate, ConfigKey, NewConfigEntry};
use crate::domain::DomainError;

/// Persistent source of truth for games and configuration entries
///
/// Every write that changes what a game's cache artifact would contain bumps
/// that game's revision atomically with the write itself.
#[async_trait]
pub trait ConfigStore: Send + Sync + Debug {
    /// Find an active game by the hash of its API key
    async fn find_active_game_by_key_hash(&self, hash: &KeyHash)
    -> Result<Option<Game>, DomainError>;

    /// Get a game by ID regardless of its active flag
    async fn get_game(&self, id: &GameId) -> Result<Option<Game>, DomainError>;

    /// List all games, newest first
    async fn list_games(&self) -> Result<Vec<Game>, DomainError>;

    /// Persist a new game; the key hash must be unique
    async fn create_game(&self, game: NewGame) -> Result<Game, DomainError>;

    /// Apply a partial update to a game
    async fn update_game(&self, id: &GameId, update: GameUpdate) -> Result<Game, DomainError>;

    /// Replace a game's key hash; the previous hash stops resolving immediately
    async fn replace_key_hash(
        &self,
        id: &GameId,
        new_hash: KeyHash,
    ) -> Result<KeyRotation, DomainError>;

    /// Delete a game and all its configuration entries
    async fn delete_game(&self, id: &GameId) -> Result<Option<Game>, DomainError>;

    /// Active entries of a game, ordered by key
    async fn list_active_config_entries(
        &self,
        game_id: &GameId,
    ) -> Result<Vec<ConfigEntry>, DomainError>;

    /// All entries of a game, ordered by key
    async fn list_config_entries(&self, game_id: &GameId) -> Result<Vec<ConfigEntry>, DomainError>;

    /// Number of entries owned by a game
    async fn count_config_entries(&self, game_id: &GameId) -> Result<usize, DomainError> {
        Ok(self.list_config_entries(game_id).await?.len())
    }

    async fn get_config_entry(&self, id: &ConfigEntryId)
    -> Result<Option<ConfigEntry>, DomainError>;

    async fn find_config_entry(
        &self,
        game_id: &GameId,
        key: &ConfigKey,
    ) -> Result<Option<ConfigEntry>, DomainError>;

    /// Insert an entry; `(game_id, key)` must be unique
    async fn insert_config_entry(&self, entry: NewConfigEntry) -> Result<ConfigEntry, DomainError>;

    /// Apply a partial update; renaming onto an existing key is a conflict
    async fn update_config_entry(
        &self,
        id: &ConfigEntryId,
        update: ConfigEntryUpdate,
    ) -> Result<ConfigEntry, DomainError>;

    /// Delete an entry, returning it so callers know the owning game
    async fn delete_config_entry(
        &self,
        id: &ConfigEntryId,
    ) -> Result<Option<ConfigEntry>, DomainError>;

    /// Connectivity check
    async fn ping(&self) -> Result<(), DomainError>;
}
