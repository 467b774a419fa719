//! Admin service - game and configuration entry management
//!
//! Every write is followed by the matching cache action before returning, so
//! a read issued after a successful write never sees the previous state.

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::domain::config_entry::encode_value;
use crate::domain::{
    ConfigEntry, ConfigEntryId, ConfigEntryUpdate, ConfigKey, ConfigStore, DomainError, Game,
    GameId, GameUpdate, KeyHash, NewConfigEntry, NewGame, ValidationLimits,
};
use crate::infrastructure::api_key::KeyCodec;
use crate::infrastructure::cache::ConfigCache;

/// Request to create a new game
#[derive(Debug, Clone)]
pub struct CreateGameRequest {
    pub name: String,
    pub active: bool,
}

/// Request to update an existing game
#[derive(Debug, Clone, Default)]
pub struct UpdateGameRequest {
    pub name: Option<String>,
    pub active: Option<bool>,
}

/// Request to create a configuration entry
#[derive(Debug, Clone)]
pub struct CreateConfigEntryRequest {
    pub key: String,
    pub value: Value,
    pub description: Option<String>,
    pub active: bool,
}

/// Request to set the value of a key, creating the entry when absent
#[derive(Debug, Clone)]
pub struct UpsertConfigEntryRequest {
    pub value: Value,
    pub description: Option<String>,
    /// Defaults to active for new entries and unchanged for existing ones
    pub active: Option<bool>,
}

/// Request to update a configuration entry
#[derive(Debug, Clone, Default)]
pub struct UpdateConfigEntryRequest {
    pub key: Option<String>,
    pub value: Option<Value>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    pub active: Option<bool>,
}

/// A game together with its raw API key, which is only ever returned here
#[derive(Debug, Clone)]
pub struct IssuedGameKey {
    pub game: Game,
    pub api_key: String,
}

/// Game listing row
#[derive(Debug, Clone)]
pub struct GameSummary {
    pub game: Game,
    pub entry_count: usize,
}

#[derive(Debug, Clone)]
pub struct AdminService {
    codec: KeyCodec,
    store: Arc<dyn ConfigStore>,
    cache: ConfigCache,
    limits: ValidationLimits,
}

impl AdminService {
    pub fn new(
        codec: KeyCodec,
        store: Arc<dyn ConfigStore>,
        cache: ConfigCache,
        limits: ValidationLimits,
    ) -> Self {
        Self {
            codec,
            store,
            cache,
            limits,
        }
    }

    /// Create a game with a fresh API key
    pub async fn create_game(&self, request: CreateGameRequest) -> Result<IssuedGameKey, DomainError> {
        let name = self.limits.validate_game_name(&request.name)?;
        let generated = self.codec.generate()?;

        let game = self
            .store
            .create_game(NewGame {
                name,
                key_hash: generated.hash,
                active: request.active,
            })
            .await?;

        info!(game_id = %game.id(), key_hash = game.key_hash().short(), "Created game");

        self.refresh(game.id()).await?;

        Ok(IssuedGameKey {
            game,
            api_key: generated.key,
        })
    }

    /// Get a game by ID, returning an error if not found
    pub async fn get_game(&self, id: &GameId) -> Result<Game, DomainError> {
        self.store
            .get_game(id)
            .await?
            .ok_or_else(|| DomainError::game_not_found(format!("Game '{}' not found", id)))
    }

    /// List all games with their entry counts, newest first
    pub async fn list_games(&self) -> Result<Vec<GameSummary>, DomainError> {
        let games = self.store.list_games().await?;
        let mut summaries = Vec::with_capacity(games.len());

        for game in games {
            let entry_count = self.store.count_config_entries(game.id()).await?;
            summaries.push(GameSummary { game, entry_count });
        }

        Ok(summaries)
    }

    /// Rename, activate or deactivate a game
    pub async fn update_game(
        &self,
        id: &GameId,
        request: UpdateGameRequest,
    ) -> Result<Game, DomainError> {
        let name = request
            .name
            .as_deref()
            .map(|n| self.limits.validate_game_name(n))
            .transpose()?;

        let game = self
            .store
            .update_game(
                id,
                GameUpdate {
                    name,
                    active: request.active,
                },
            )
            .await?;

        info!(game_id = %id, active = game.is_active(), "Updated game");

        self.refresh(id).await?;
        Ok(game)
    }

    /// Replace a game's API key; the previous key stops resolving at once
    pub async fn regenerate_key(&self, id: &GameId) -> Result<IssuedGameKey, DomainError> {
        let generated = self.codec.generate()?;
        let rotation = self.store.replace_key_hash(id, generated.hash).await?;

        info!(
            game_id = %id,
            old_key_hash = rotation.previous_hash.short(),
            key_hash = rotation.game.key_hash().short(),
            "Regenerated API key"
        );

        self.revoke(&rotation.previous_hash, id, rotation.game.revision())
            .await?;
        self.refresh(id).await?;

        Ok(IssuedGameKey {
            game: rotation.game,
            api_key: generated.key,
        })
    }

    /// Delete a game and all its configuration entries
    pub async fn delete_game(&self, id: &GameId) -> Result<Game, DomainError> {
        let game = self
            .store
            .delete_game(id)
            .await?
            .ok_or_else(|| DomainError::game_not_found(format!("Game '{}' not found", id)))?;

        info!(game_id = %id, key_hash = game.key_hash().short(), "Deleted game");

        // The store forgets the game, so its tombstone has to outrank every
        // revision a concurrent rebuild could have read
        self.revoke(game.key_hash(), id, game.revision() + 1).await?;
        Ok(game)
    }

    /// All entries of a game, ordered by key
    pub async fn list_config_entries(&self, game_id: &GameId) -> Result<Vec<ConfigEntry>, DomainError> {
        self.get_game(game_id).await?;
        self.store.list_config_entries(game_id).await
    }

    pub async fn get_config_entry(&self, id: &ConfigEntryId) -> Result<ConfigEntry, DomainError> {
        self.store
            .get_config_entry(id)
            .await?
            .ok_or_else(|| DomainError::config_not_found(format!("Config entry '{}' not found", id)))
    }

    /// Create an entry; fails with `DuplicateConfigKey` if the key exists
    pub async fn create_config_entry(
        &self,
        game_id: &GameId,
        request: CreateConfigEntryRequest,
    ) -> Result<ConfigEntry, DomainError> {
        let entry = NewConfigEntry {
            game_id: *game_id,
            key: parse_key(&request.key)?,
            value: self.encode(&request.value)?,
            description: self
                .limits
                .validate_description(request.description.as_deref())?,
            active: request.active,
        };

        let entry = self.store.insert_config_entry(entry).await?;
        info!(game_id = %game_id, key = %entry.key(), "Created config entry");

        self.refresh(game_id).await?;
        Ok(entry)
    }

    /// Set a key's value, creating the entry if needed
    ///
    /// Returns the entry and whether it was created.
    pub async fn upsert_config_entry(
        &self,
        game_id: &GameId,
        key: &str,
        request: UpsertConfigEntryRequest,
    ) -> Result<(ConfigEntry, bool), DomainError> {
        let key = parse_key(key)?;
        let value = self.encode(&request.value)?;
        let description = self
            .limits
            .validate_description(request.description.as_deref())?;

        let update = ConfigEntryUpdate {
            key: None,
            value: Some(value.clone()),
            description: Some(description.clone()),
            active: request.active,
        };

        let (entry, created) = match self.store.find_config_entry(game_id, &key).await? {
            Some(existing) => (
                self.store.update_config_entry(existing.id(), update).await?,
                false,
            ),
            None => {
                let insert = self
                    .store
                    .insert_config_entry(NewConfigEntry {
                        game_id: *game_id,
                        key: key.clone(),
                        value,
                        description,
                        active: request.active.unwrap_or(true),
                    })
                    .await;

                match insert {
                    Ok(entry) => (entry, true),
                    // Lost a race with a concurrent insert of the same key
                    Err(DomainError::DuplicateConfigKey { .. }) => {
                        let existing = self
                            .store
                            .find_config_entry(game_id, &key)
                            .await?
                            .ok_or_else(|| DomainError::duplicate_config_key(key.as_str()))?;
                        (
                            self.store.update_config_entry(existing.id(), update).await?,
                            false,
                        )
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        info!(game_id = %game_id, key = %entry.key(), created, "Upserted config entry");

        self.refresh(game_id).await?;
        Ok((entry, created))
    }

    /// Apply a partial update to an entry
    pub async fn update_config_entry(
        &self,
        id: &ConfigEntryId,
        request: UpdateConfigEntryRequest,
    ) -> Result<ConfigEntry, DomainError> {
        let update = ConfigEntryUpdate {
            key: request.key.as_deref().map(parse_key).transpose()?,
            value: request.value.as_ref().map(|v| self.encode(v)).transpose()?,
            description: request
                .description
                .map(|d| self.limits.validate_description(d.as_deref()))
                .transpose()?,
            active: request.active,
        };

        let entry = self.store.update_config_entry(id, update).await?;
        info!(game_id = %entry.game_id(), key = %entry.key(), "Updated config entry");

        self.refresh(entry.game_id()).await?;
        Ok(entry)
    }

    pub async fn delete_config_entry(&self, id: &ConfigEntryId) -> Result<ConfigEntry, DomainError> {
        let entry = self
            .store
            .delete_config_entry(id)
            .await?
            .ok_or_else(|| DomainError::config_not_found(format!("Config entry '{}' not found", id)))?;

        info!(game_id = %entry.game_id(), key = %entry.key(), "Deleted config entry");

        self.refresh(entry.game_id()).await?;
        Ok(entry)
    }

    /// Rebuild the artifact of every game, returning how many were rebuilt
    pub async fn rebuild_all(&self) -> Result<usize, DomainError> {
        let games = self.store.list_games().await?;
        let mut rebuilt = 0;

        for game in &games {
            self.refresh(game.id()).await?;
            rebuilt += 1;
        }

        info!(games = rebuilt, "Rebuilt all configuration caches");
        Ok(rebuilt)
    }

    fn encode(&self, value: &Value) -> Result<String, DomainError> {
        let raw = encode_value(value);
        self.limits.validate_value(&raw)?;
        Ok(raw)
    }

    /// Bring a game's artifact up to date after a committed write
    ///
    /// When the rebuild fails the outdated artifact is evicted instead, so
    /// reads fall through to the store until the next successful rebuild.
    async fn refresh(&self, game_id: &GameId) -> Result<(), DomainError> {
        let rebuild_error = match self.cache.rebuild(game_id).await {
            Ok(_) => return Ok(()),
            Err(e) => e,
        };

        error!(game_id = %game_id, error = %rebuild_error, "Cache rebuild after write failed");

        let Some(game) = self.store.get_game(game_id).await? else {
            return Ok(());
        };

        self.cache.evict(game.key_hash(), game.revision()).await?;
        warn!(game_id = %game_id, key_hash = game.key_hash().short(), "Evicted outdated cache artifact");
        Ok(())
    }

    /// Tombstone a hash, falling back to evicting its live artifact
    async fn revoke(&self, hash: &KeyHash, game_id: &GameId, revision: u64) -> Result<(), DomainError> {
        let invalidate_error = match self.cache.invalidate(hash, game_id, revision).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        error!(game_id = %game_id, key_hash = hash.short(), error = %invalidate_error, "Cache invalidation failed");

        self.cache.evict(hash, revision).await?;
        warn!(game_id = %game_id, key_hash = hash.short(), "Evicted revoked cache artifact");
        Ok(())
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, DomainError> {
    ConfigKey::new(key).map_err(|e| DomainError::validation(e.to_string()))
}
