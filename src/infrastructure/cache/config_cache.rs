//! Materialized configuration cache
//!
//! Couples the config store with an artifact store: artifacts are derived
//! from the store on rebuild and never read back into it.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::domain::api_key::KeyHash;
use crate::domain::cache::{ArtifactStore, CacheArtifact, CacheLookup, CachedConfig, ReplaceOutcome};
use crate::domain::config_entry::decode_value;
use crate::domain::game::{ConfigStore, Game, GameId};
use crate::domain::DomainError;

#[derive(Debug, Clone)]
pub struct ConfigCache {
    store: Arc<dyn ConfigStore>,
    artifacts: Arc<dyn ArtifactStore>,
}

impl ConfigCache {
    pub fn new(store: Arc<dyn ConfigStore>, artifacts: Arc<dyn ArtifactStore>) -> Self {
        Self { store, artifacts }
    }

    /// Read the artifact for a key hash without touching the store
    pub async fn lookup(&self, hash: &KeyHash) -> Result<CacheLookup, DomainError> {
        self.artifacts.read(hash).await
    }

    /// Recompute a game's artifact from current store state
    ///
    /// Returns the live configuration on disk afterwards, which is this
    /// rebuild's result or a newer one written concurrently. A missing game
    /// is a no-op; an inactive game gets its hash tombstoned.
    pub async fn rebuild(&self, game_id: &GameId) -> Result<Option<CachedConfig>, DomainError> {
        let Some(game) = self.store.get_game(game_id).await? else {
            debug!(game_id = %game_id, "Skipping rebuild of missing game");
            return Ok(None);
        };

        let hash = game.key_hash().clone();

        if !game.is_active() {
            self.artifacts
                .invalidate(&hash, game.id(), game.revision())
                .await?;
            debug!(game_id = %game_id, key_hash = hash.short(), "Tombstoned inactive game");
            return Ok(None);
        }

        let candidate = self.snapshot(&game).await?;

        let current = match self.artifacts.replace(&hash, &candidate).await? {
            ReplaceOutcome::Written => candidate,
            ReplaceOutcome::Superseded(existing) => existing,
        };

        info!(
            game_id = %game_id,
            key_hash = hash.short(),
            revision = current.revision(),
            "Rebuilt configuration cache"
        );

        Ok(CachedConfig::from_artifact(hash, current))
    }

    /// Resolve a game's live configuration from the store without caching it
    pub async fn materialize(&self, game: &Game) -> Result<CachedConfig, DomainError> {
        let artifact = self.snapshot(game).await?;

        CachedConfig::from_artifact(game.key_hash().clone(), artifact)
            .ok_or_else(|| DomainError::internal("Snapshot of an active game is not live"))
    }

    async fn snapshot(&self, game: &Game) -> Result<CacheArtifact, DomainError> {
        let entries = self.store.list_active_config_entries(game.id()).await?;
        let config: BTreeMap<String, serde_json::Value> = entries
            .iter()
            .map(|entry| (entry.key().to_string(), decode_value(entry.value())))
            .collect();

        Ok(CacheArtifact::Live {
            game_id: *game.id(),
            revision: game.revision(),
            config,
        })
    }

    /// Make a hash unresolvable
    pub async fn invalidate(
        &self,
        hash: &KeyHash,
        game_id: &GameId,
        revision: u64,
    ) -> Result<(), DomainError> {
        self.artifacts.invalidate(hash, game_id, revision).await?;
        info!(game_id = %game_id, key_hash = hash.short(), revision, "Invalidated configuration cache");
        Ok(())
    }

    /// Drop a live artifact older than `revision` so reads fall back to the store
    pub async fn evict(&self, hash: &KeyHash, revision: u64) -> Result<bool, DomainError> {
        self.artifacts.evict(hash, revision).await
    }

    pub async fn purge(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        self.artifacts.purge(now).await
    }

    pub async fn ping(&self) -> Result<(), DomainError> {
        self.artifacts.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    use crate::domain::config_entry::{ConfigEntryUpdate, ConfigKey, NewConfigEntry};
    use crate::domain::game::{GameUpdate, NewGame};
    use crate::infrastructure::cache::FileArtifactStore;
    use crate::infrastructure::store::InMemoryConfigStore;

    fn hash(c: char) -> KeyHash {
        KeyHash::new(c.to_string().repeat(64)).unwrap()
    }

    struct Fixture {
        _dir: TempDir,
        store: Arc<InMemoryConfigStore>,
        artifacts: Arc<FileArtifactStore>,
        cache: ConfigCache,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(InMemoryConfigStore::new());
        let artifacts = Arc::new(FileArtifactStore::new(dir.path()).unwrap());
        let cache = ConfigCache::new(store.clone(), artifacts.clone());

        Fixture {
            _dir: dir,
            store,
            artifacts,
            cache,
        }
    }

    async fn add_entry(store: &InMemoryConfigStore, game_id: GameId, key: &str, value: &str, active: bool) {
        store
            .insert_config_entry(NewConfigEntry {
                game_id,
                key: ConfigKey::new(key).unwrap(),
                value: value.to_string(),
                description: None,
                active,
            })
            .await
            .unwrap();
    }

    async fn new_game(store: &InMemoryConfigStore, c: char) -> GameId {
        *store
            .create_game(NewGame {
                name: "Arena".to_string(),
                key_hash: hash(c),
                active: true,
            })
            .await
            .unwrap()
            .id()
    }

    #[tokio::test]
    async fn test_rebuild_decodes_active_entries() {
        let f = fixture();
        let game_id = new_game(&f.store, 'a').await;

        add_entry(&f.store, game_id, "max_players", "10", true).await;
        add_entry(&f.store, game_id, "welcome_msg", "hello", true).await;
        add_entry(&f.store, game_id, "secret_mode", "true", false).await;

        let cached = f.cache.rebuild(&game_id).await.unwrap().unwrap();
        assert_eq!(cached.key_hash, hash('a'));
        assert_eq!(cached.config.len(), 2);
        assert_eq!(cached.config["max_players"], json!(10));
        assert_eq!(cached.config["welcome_msg"], json!("hello"));

        assert_eq!(f.cache.lookup(&hash('a')).await.unwrap(), CacheLookup::Hit(cached));
    }

    #[tokio::test]
    async fn test_rebuild_is_idempotent() {
        let f = fixture();
        let game_id = new_game(&f.store, 'a').await;
        add_entry(&f.store, game_id, "spawn", r#"{"x":1,"y":2}"#, true).await;

        let path = f.artifacts.directory().join(format!("{}.json", hash('a')));

        f.cache.rebuild(&game_id).await.unwrap();
        let first = std::fs::read(&path).unwrap();

        f.cache.rebuild(&game_id).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), first);
    }

    #[tokio::test]
    async fn test_rebuild_inactive_game_tombstones() {
        let f = fixture();
        let game_id = new_game(&f.store, 'a').await;
        add_entry(&f.store, game_id, "max_players", "10", true).await;
        f.cache.rebuild(&game_id).await.unwrap();

        f.store
            .update_game(&game_id, GameUpdate { name: None, active: Some(false) })
            .await
            .unwrap();

        assert!(f.cache.rebuild(&game_id).await.unwrap().is_none());
        assert_eq!(f.cache.lookup(&hash('a')).await.unwrap(), CacheLookup::Revoked);
    }

    #[tokio::test]
    async fn test_rebuild_missing_game_is_noop() {
        let f = fixture();
        assert!(f.cache.rebuild(&GameId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rebuild_reflects_latest_write() {
        let f = fixture();
        let game_id = new_game(&f.store, 'a').await;
        add_entry(&f.store, game_id, "max_players", "10", true).await;
        f.cache.rebuild(&game_id).await.unwrap();

        let entry = f
            .store
            .find_config_entry(&game_id, &ConfigKey::new("max_players").unwrap())
            .await
            .unwrap()
            .unwrap();
        f.store
            .update_config_entry(
                entry.id(),
                ConfigEntryUpdate {
                    value: Some("12".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let cached = f.cache.rebuild(&game_id).await.unwrap().unwrap();
        assert_eq!(cached.config["max_players"], json!(12));
    }

    #[tokio::test]
    async fn test_evict_falls_back_to_miss() {
        let f = fixture();
        let game_id = new_game(&f.store, 'a').await;
        let cached = f.cache.rebuild(&game_id).await.unwrap().unwrap();

        assert!(f.cache.evict(&hash('a'), cached.revision + 1).await.unwrap());
        assert_eq!(f.cache.lookup(&hash('a')).await.unwrap(), CacheLookup::Miss);
    }
}
