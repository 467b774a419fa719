//! In-memory config store implementation

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::api_key::KeyHash;
use crate::domain::config_entry::{
    ConfigEntry, ConfigEntryId, ConfigEntryUpdate, ConfigKey, NewConfigEntry,
};
use crate::domain::game::{ConfigStore, Game, GameId, GameUpdate, KeyRotation, NewGame};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct Tables {
    games: HashMap<GameId, Game>,
    entries: HashMap<ConfigEntryId, ConfigEntry>,
}

impl Tables {
    fn game_mut(&mut self, id: &GameId) -> Result<&mut Game, DomainError> {
        self.games
            .get_mut(id)
            .ok_or_else(|| DomainError::game_not_found(format!("Game '{}' not found", id)))
    }

    fn key_taken(&self, game_id: &GameId, key: &ConfigKey, except: Option<&ConfigEntryId>) -> bool {
        self.entries.values().any(|e| {
            e.game_id() == game_id && e.key() == key && Some(e.id()) != except
        })
    }

    fn hash_taken(&self, hash: &KeyHash) -> bool {
        self.games.values().any(|g| g.key_hash() == hash)
    }

    fn entries_of(&self, game_id: &GameId, active_only: bool) -> Vec<ConfigEntry> {
        let mut entries: Vec<ConfigEntry> = self
            .entries
            .values()
            .filter(|e| e.game_id() == game_id && (!active_only || e.is_active()))
            .cloned()
            .collect();

        entries.sort_by(|a, b| a.key().cmp(b.key()));
        entries
    }
}

/// Thread-safe in-memory config store
///
/// Useful for testing and development. Data is lost when the process terminates.
/// A single lock covers games and entries so revision bumps are atomic with
/// the writes that cause them.
#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    tables: RwLock<Tables>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, DomainError> {
        self.tables
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>, DomainError> {
        self.tables
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))
    }
}

#[async_trait]
impl ConfigStore for InMemoryConfigStore {
    async fn find_active_game_by_key_hash(
        &self,
        hash: &KeyHash,
    ) -> Result<Option<Game>, DomainError> {
        let tables = self.read()?;

        Ok(tables
            .games
            .values()
            .find(|g| g.key_hash() == hash && g.is_active())
            .cloned())
    }

    async fn get_game(&self, id: &GameId) -> Result<Option<Game>, DomainError> {
        Ok(self.read()?.games.get(id).cloned())
    }

    async fn list_games(&self) -> Result<Vec<Game>, DomainError> {
        let mut games: Vec<Game> = self.read()?.games.values().cloned().collect();
        games.sort_by(|a, b| b.created_at().cmp(&a.created_at()).then(a.id().cmp(b.id())));
        Ok(games)
    }

    async fn create_game(&self, game: NewGame) -> Result<Game, DomainError> {
        let mut tables = self.write()?;

        if tables.hash_taken(&game.key_hash) {
            return Err(DomainError::internal("API key hash already in use"));
        }

        let created = Game::new(GameId::new(), game.name, game.key_hash).with_active(game.active);
        tables.games.insert(*created.id(), created.clone());

        Ok(created)
    }

    async fn update_game(&self, id: &GameId, update: GameUpdate) -> Result<Game, DomainError> {
        let mut tables = self.write()?;
        let game = tables.game_mut(id)?;

        if update.is_empty() {
            return Ok(game.clone());
        }

        if let Some(name) = update.name {
            game.set_name(name);
        }

        if let Some(active) = update.active {
            game.set_active(active);
        }

        game.bump_revision();
        Ok(game.clone())
    }

    async fn replace_key_hash(
        &self,
        id: &GameId,
        new_hash: KeyHash,
    ) -> Result<KeyRotation, DomainError> {
        let mut tables = self.write()?;

        if tables.hash_taken(&new_hash) {
            return Err(DomainError::internal("API key hash already in use"));
        }

        let game = tables.game_mut(id)?;
        let previous_hash = game.key_hash().clone();

        game.set_key_hash(new_hash);
        game.bump_revision();

        Ok(KeyRotation {
            game: game.clone(),
            previous_hash,
        })
    }

    async fn delete_game(&self, id: &GameId) -> Result<Option<Game>, DomainError> {
        let mut tables = self.write()?;
        let removed = tables.games.remove(id);

        if removed.is_some() {
            tables.entries.retain(|_, e| e.game_id() != id);
        }

        Ok(removed)
    }

    async fn list_active_config_entries(
        &self,
        game_id: &GameId,
    ) -> Result<Vec<ConfigEntry>, DomainError> {
        Ok(self.read()?.entries_of(game_id, true))
    }

    async fn list_config_entries(&self, game_id: &GameId) -> Result<Vec<ConfigEntry>, DomainError> {
        Ok(self.read()?.entries_of(game_id, false))
    }

    async fn count_config_entries(&self, game_id: &GameId) -> Result<usize, DomainError> {
        let tables = self.read()?;
        Ok(tables.entries.values().filter(|e| e.game_id() == game_id).count())
    }

    async fn get_config_entry(
        &self,
        id: &ConfigEntryId,
    ) -> Result<Option<ConfigEntry>, DomainError> {
        Ok(self.read()?.entries.get(id).cloned())
    }

    async fn find_config_entry(
        &self,
        game_id: &GameId,
        key: &ConfigKey,
    ) -> Result<Option<ConfigEntry>, DomainError> {
        let tables = self.read()?;

        Ok(tables
            .entries
            .values()
            .find(|e| e.game_id() == game_id && e.key() == key)
            .cloned())
    }

    async fn insert_config_entry(&self, entry: NewConfigEntry) -> Result<ConfigEntry, DomainError> {
        let mut tables = self.write()?;

        tables.game_mut(&entry.game_id)?;

        if tables.key_taken(&entry.game_id, &entry.key, None) {
            return Err(DomainError::duplicate_config_key(entry.key.as_str()));
        }

        let created = entry.into_entry();
        tables.game_mut(created.game_id())?.bump_revision();
        tables.entries.insert(*created.id(), created.clone());

        Ok(created)
    }

    async fn update_config_entry(
        &self,
        id: &ConfigEntryId,
        update: ConfigEntryUpdate,
    ) -> Result<ConfigEntry, DomainError> {
        let mut tables = self.write()?;

        let game_id = *tables
            .entries
            .get(id)
            .ok_or_else(|| DomainError::config_not_found(format!("Config entry '{}' not found", id)))?
            .game_id();

        if let Some(key) = &update.key {
            if tables.key_taken(&game_id, key, Some(id)) {
                return Err(DomainError::duplicate_config_key(key.as_str()));
            }
        }

        tables.game_mut(&game_id)?.bump_revision();

        let entry = tables
            .entries
            .get_mut(id)
            .ok_or_else(|| DomainError::config_not_found(format!("Config entry '{}' not found", id)))?;
        entry.apply(update);

        Ok(entry.clone())
    }

    async fn delete_config_entry(
        &self,
        id: &ConfigEntryId,
    ) -> Result<Option<ConfigEntry>, DomainError> {
        let mut tables = self.write()?;
        let removed = tables.entries.remove(id);

        if let Some(entry) = &removed {
            if let Some(game) = tables.games.get_mut(entry.game_id()) {
                game.bump_revision();
            }
        }

        Ok(removed)
    }

    async fn ping(&self) -> Result<(), DomainError> {
        self.read().map(|_| ())
    }
}
