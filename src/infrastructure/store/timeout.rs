//! Query timeout decorator for config stores

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::api_key::KeyHash;
use crate::domain::config_entry::{
    ConfigEntry, ConfigEntryId, ConfigEntryUpdate, ConfigKey, NewConfigEntry,
};
use crate::domain::game::{ConfigStore, Game, GameId, GameUpdate, KeyRotation, NewGame};
use crate::domain::DomainError;

/// Config store wrapper bounding every operation with a timeout
///
/// An elapsed operation surfaces as `StorageUnavailable`.
#[derive(Debug)]
pub struct TimeoutConfigStore<S: ConfigStore> {
    inner: S,
    timeout: Duration,
}

impl<S: ConfigStore> TimeoutConfigStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, DomainError>> + Send,
    ) -> Result<T, DomainError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Store operation timed out"
                );
                Err(DomainError::storage(format!(
                    "Store operation '{}' timed out after {}ms",
                    operation,
                    self.timeout.as_millis()
                )))
            }
        }
    }
}

#[async_trait]
impl<S: ConfigStore> ConfigStore for TimeoutConfigStore<S> {
    async fn find_active_game_by_key_hash(
        &self,
        hash: &KeyHash,
    ) -> Result<Option<Game>, DomainError> {
        self.bounded(
            "find_active_game_by_key_hash",
            self.inner.find_active_game_by_key_hash(hash),
        )
        .await
    }

    async fn get_game(&self, id: &GameId) -> Result<Option<Game>, DomainError> {
        self.bounded("get_game", self.inner.get_game(id)).await
    }

    async fn list_games(&self) -> Result<Vec<Game>, DomainError> {
        self.bounded("list_games", self.inner.list_games()).await
    }

    async fn create_game(&self, game: NewGame) -> Result<Game, DomainError> {
        self.bounded("create_game", self.inner.create_game(game)).await
    }

    async fn update_game(&self, id: &GameId, update: GameUpdate) -> Result<Game, DomainError> {
        self.bounded("update_game", self.inner.update_game(id, update))
            .await
    }

    async fn replace_key_hash(
        &self,
        id: &GameId,
        new_hash: KeyHash,
    ) -> Result<KeyRotation, DomainError> {
        self.bounded("replace_key_hash", self.inner.replace_key_hash(id, new_hash))
            .await
    }

    async fn delete_game(&self, id: &GameId) -> Result<Option<Game>, DomainError> {
        self.bounded("delete_game", self.inner.delete_game(id)).await
    }

    async fn list_active_config_entries(
        &self,
        game_id: &GameId,
    ) -> Result<Vec<ConfigEntry>, DomainError> {
        self.bounded(
            "list_active_config_entries",
            self.inner.list_active_config_entries(game_id),
        )
        .await
    }

    async fn list_config_entries(&self, game_id: &GameId) -> Result<Vec<ConfigEntry>, DomainError> {
        self.bounded("list_config_entries", self.inner.list_config_entries(game_id))
            .await
    }

    async fn count_config_entries(&self, game_id: &GameId) -> Result<usize, DomainError> {
        self.bounded("count_config_entries", self.inner.count_config_entries(game_id))
            .await
    }

    async fn get_config_entry(
        &self,
        id: &ConfigEntryId,
    ) -> Result<Option<ConfigEntry>, DomainError> {
        self.bounded("get_config_entry", self.inner.get_config_entry(id))
            .await
    }

    async fn find_config_entry(
        &self,
        game_id: &GameId,
        key: &ConfigKey,
    ) -> Result<Option<ConfigEntry>, DomainError> {
        self.bounded("find_config_entry", self.inner.find_config_entry(game_id, key))
            .await
    }

    async fn insert_config_entry(&self, entry: NewConfigEntry) -> Result<ConfigEntry, DomainError> {
        self.bounded("insert_config_entry", self.inner.insert_config_entry(entry))
            .await
    }

    async fn update_config_entry(
        &self,
        id: &ConfigEntryId,
        update: ConfigEntryUpdate,
    ) -> Result<ConfigEntry, DomainError> {
        self.bounded(
            "update_config_entry",
            self.inner.update_config_entry(id, update),
        )
        .await
    }

    async fn delete_config_entry(
        &self,
        id: &ConfigEntryId,
    ) -> Result<Option<ConfigEntry>, DomainError> {
        self.bounded("delete_config_entry", self.inner.delete_config_entry(id))
            .await
    }

    async fn ping(&self) -> Result<(), DomainError> {
        self.bounded("ping", self.inner.ping()).await
    }
}
