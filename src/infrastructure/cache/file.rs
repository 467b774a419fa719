//! File-backed artifact store
//!
//! Layout of the cache directory:
//! - `<hash>.json`: the artifact, replaced only by atomic rename
//! - `<hash>.lock`: advisory lock guarding the compare-and-rename
//! - `.tmp-*`: in-flight writes, renamed over the artifact once fsynced

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use tempfile::Builder;
use tracing::{debug, warn};

use crate::domain::api_key::KeyHash;
use crate::domain::cache::{ArtifactStore, CacheArtifact, CacheLookup, CachedConfig, ReplaceOutcome};
use crate::domain::DomainError;

const ARTIFACT_EXT: &str = "json";
const LOCK_EXT: &str = "lock";
const TEMP_PREFIX: &str = ".tmp-";

/// In-flight temp files older than this are considered orphaned
const ORPHAN_TEMP_AGE: Duration = Duration::from_secs(3600);

/// Artifact store writing one JSON file per key hash
#[derive(Debug, Clone)]
pub struct FileArtifactStore {
    directory: PathBuf,
    ttl: Option<Duration>,
    tombstone_retention: Duration,
}

impl FileArtifactStore {
    /// Create the store, creating the directory when missing
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let directory = directory.into();

        fs::create_dir_all(&directory).map_err(|e| {
            DomainError::cache(format!(
                "Failed to create cache directory {}: {}",
                directory.display(),
                e
            ))
        })?;

        Ok(Self {
            directory,
            ttl: None,
            tombstone_retention: Duration::from_secs(86_400),
        })
    }

    /// Treat live artifacts older than `ttl` as missing
    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_tombstone_retention(mut self, retention: Duration) -> Self {
        self.tombstone_retention = retention;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn artifact_path(&self, hash: &KeyHash) -> PathBuf {
        self.directory
            .join(format!("{}.{}", hash.as_str(), ARTIFACT_EXT))
    }

    fn lock_path(&self, hash: &KeyHash) -> PathBuf {
        self.directory.join(format!("{}.{}", hash.as_str(), LOCK_EXT))
    }

    /// Run blocking filesystem work off the async runtime
    async fn blocking<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        T: Send + 'static,
        F: FnOnce(FileArtifactStore) -> Result<T, DomainError> + Send + 'static,
    {
        let store = self.clone();

        tokio::task::spawn_blocking(move || work(store))
            .await
            .map_err(|e| DomainError::internal(format!("Cache task failed: {}", e)))?
    }

    fn read_blocking(&self, hash: &KeyHash, now: DateTime<Utc>) -> Result<CacheLookup, DomainError> {
        let path = self.artifact_path(hash);

        let Some((artifact, modified)) = read_artifact(&path)? else {
            return Ok(CacheLookup::Miss);
        };

        if artifact.is_live() && self.is_expired(modified, self.ttl, now) {
            debug!(key_hash = hash.short(), "Cache artifact expired");
            return Ok(CacheLookup::Miss);
        }

        Ok(match CachedConfig::from_artifact(hash.clone(), artifact) {
            Some(config) => CacheLookup::Hit(config),
            None => CacheLookup::Revoked,
        })
    }

    fn replace_blocking(
        &self,
        hash: &KeyHash,
        candidate: &CacheArtifact,
    ) -> Result<ReplaceOutcome, DomainError> {
        let path = self.artifact_path(hash);
        let _guard = LockGuard::acquire(&self.lock_path(hash))?;

        if let Some((existing, _)) = read_artifact(&path)? {
            if existing.revision() > candidate.revision() {
                return Ok(ReplaceOutcome::Superseded(existing));
            }
        }

        let bytes = serde_json::to_vec(candidate)
            .map_err(|e| DomainError::cache(format!("Failed to serialize artifact: {}", e)))?;

        let mut temp = Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&self.directory)
            .map_err(|e| DomainError::cache(format!("Failed to create temp file: {}", e)))?;

        temp.write_all(&bytes)
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| DomainError::cache(format!("Failed to write artifact: {}", e)))?;

        temp.persist(&path)
            .map_err(|e| DomainError::cache(format!("Failed to publish artifact: {}", e.error)))?;

        Ok(ReplaceOutcome::Written)
    }

    fn evict_blocking(&self, hash: &KeyHash, revision: u64) -> Result<bool, DomainError> {
        let path = self.artifact_path(hash);
        let _guard = LockGuard::acquire(&self.lock_path(hash))?;

        match read_artifact(&path)? {
            Some((existing, _)) if existing.is_live() && existing.revision() < revision => {
                remove_if_exists(&path)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn purge_blocking(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let entries = fs::read_dir(&self.directory)
            .map_err(|e| DomainError::cache(format!("Failed to read cache directory: {}", e)))?;

        let mut removed = 0;

        for entry in entries {
            let entry = entry
                .map_err(|e| DomainError::cache(format!("Failed to read directory entry: {}", e)))?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            let outcome = if name.starts_with(TEMP_PREFIX) {
                self.purge_orphan(&path, ORPHAN_TEMP_AGE, now)
            } else if let Some(hash) = parse_hash(name, ARTIFACT_EXT) {
                self.purge_artifact(&hash, now)
            } else if let Some(hash) = parse_hash(name, LOCK_EXT) {
                // Lock files are not counted
                if self.artifact_path(&hash).exists() {
                    Ok(false)
                } else {
                    self.purge_orphan(&path, self.tombstone_retention, now)
                        .map(|_| false)
                }
            } else {
                Ok(false)
            };

            match outcome {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to purge cache file"),
            }
        }

        Ok(removed)
    }

    /// Remove an artifact when it is an old tombstone or an expired live one
    fn purge_artifact(&self, hash: &KeyHash, now: DateTime<Utc>) -> Result<bool, DomainError> {
        let path = self.artifact_path(hash);
        let _guard = LockGuard::acquire(&self.lock_path(hash))?;

        let Some((artifact, modified)) = read_artifact(&path)? else {
            return Ok(false);
        };

        let expired = if artifact.is_live() {
            self.is_expired(modified, self.ttl, now)
        } else {
            self.is_expired(modified, Some(self.tombstone_retention), now)
        };

        if expired {
            remove_if_exists(&path)?;
        }

        Ok(expired)
    }

    fn purge_orphan(
        &self,
        path: &Path,
        max_age: Duration,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let modified = modified_at(path)?;

        if self.is_expired(modified, Some(max_age), now) {
            remove_if_exists(path)?;
            return Ok(true);
        }

        Ok(false)
    }

    fn is_expired(
        &self,
        modified: DateTime<Utc>,
        max_age: Option<Duration>,
        now: DateTime<Utc>,
    ) -> bool {
        match max_age {
            Some(max_age) => (now - modified).to_std().is_ok_and(|age| age > max_age),
            None => false,
        }
    }
}

#[async_trait]
impl ArtifactStore for FileArtifactStore {
    async fn read(&self, hash: &KeyHash) -> Result<CacheLookup, DomainError> {
        let hash = hash.clone();
        self.blocking(move |store| store.read_blocking(&hash, Utc::now()))
            .await
    }

    async fn replace(
        &self,
        hash: &KeyHash,
        artifact: &CacheArtifact,
    ) -> Result<ReplaceOutcome, DomainError> {
        let hash = hash.clone();
        let artifact = artifact.clone();

        let outcome = self
            .blocking(move |store| store.replace_blocking(&hash, &artifact))
            .await?;

        if let ReplaceOutcome::Superseded(existing) = &outcome {
            debug!(
                existing_revision = existing.revision(),
                "Discarded cache candidate older than the artifact on disk"
            );
        }

        Ok(outcome)
    }

    async fn evict(&self, hash: &KeyHash, revision: u64) -> Result<bool, DomainError> {
        let hash = hash.clone();
        self.blocking(move |store| store.evict_blocking(&hash, revision))
            .await
    }

    async fn purge(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        self.blocking(move |store| store.purge_blocking(now)).await
    }

    async fn ping(&self) -> Result<(), DomainError> {
        self.blocking(|store| {
            Builder::new()
                .prefix(TEMP_PREFIX)
                .tempfile_in(&store.directory)
                .map(|_| ())
                .map_err(|e| DomainError::cache(format!("Cache directory is not writable: {}", e)))
        })
        .await
    }
}

/// Exclusive advisory lock released on drop
struct LockGuard {
    file: File,
}

impl LockGuard {
    fn acquire(path: &Path) -> Result<Self, DomainError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| DomainError::cache(format!("Failed to open lock file: {}", e)))?;

        FileExt::lock_exclusive(&file)
            .map_err(|e| DomainError::cache(format!("Failed to acquire lock: {}", e)))?;

        Ok(Self { file })
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Read and decode an artifact along with its modification time
///
/// A missing file is `None`. An undecodable file is also `None` so that the
/// next rebuild overwrites it.
fn read_artifact(path: &Path) -> Result<Option<(CacheArtifact, DateTime<Utc>)>, DomainError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(DomainError::cache(format!("Failed to read artifact: {}", e))),
    };

    let modified = match modified_at(path) {
        Ok(modified) => modified,
        Err(_) if !path.exists() => return Ok(None),
        Err(e) => return Err(e),
    };

    match serde_json::from_slice::<CacheArtifact>(&bytes) {
        Ok(artifact) => Ok(Some((artifact, modified))),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring undecodable cache artifact");
            Ok(None)
        }
    }
}

fn modified_at(path: &Path) -> Result<DateTime<Utc>, DomainError> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .map_err(|e| DomainError::cache(format!("Failed to stat cache file: {}", e)))
}

fn remove_if_exists(path: &Path) -> Result<(), DomainError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(DomainError::cache(format!("Failed to remove cache file: {}", e))),
    }
}

fn parse_hash(file_name: &str, ext: &str) -> Option<KeyHash> {
    let stem = file_name.strip_suffix(ext)?.strip_suffix('.')?;
    KeyHash::new(stem).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use serde_json::json;
    use tempfile::TempDir;

    use crate::domain::game::GameId;

    fn hash(c: char) -> KeyHash {
        KeyHash::new(c.to_string().repeat(64)).unwrap()
    }

    fn live(game_id: GameId, revision: u64, value: i64) -> CacheArtifact {
        let mut config = BTreeMap::new();
        config.insert("max_players".to_string(), json!(value));
        CacheArtifact::Live {
            game_id,
            revision,
            config,
        }
    }

    fn store(dir: &TempDir) -> FileArtifactStore {
        FileArtifactStore::new(dir.path().join("cache")).unwrap()
    }

    #[tokio::test]
    async fn test_missing_artifact_is_miss() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        assert_eq!(store.read(&hash('a')).await.unwrap(), CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_replace_then_read() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let game_id = GameId::new();

        let outcome = store.replace(&hash('a'), &live(game_id, 1, 10)).await.unwrap();
        assert_eq!(outcome, ReplaceOutcome::Written);

        match store.read(&hash('a')).await.unwrap() {
            CacheLookup::Hit(cached) => {
                assert_eq!(cached.game_id, game_id);
                assert_eq!(cached.revision, 1);
                assert_eq!(cached.config["max_players"], json!(10));
            }
            other => panic!("expected hit, got {:?}", other),
        }

        assert!(store.directory().join(format!("{}.json", hash('a'))).exists());
    }

    #[tokio::test]
    async fn test_older_candidate_is_superseded() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let game_id = GameId::new();

        store.replace(&hash('a'), &live(game_id, 3, 30)).await.unwrap();

        let outcome = store.replace(&hash('a'), &live(game_id, 2, 20)).await.unwrap();
        assert_eq!(outcome, ReplaceOutcome::Superseded(live(game_id, 3, 30)));

        match store.read(&hash('a')).await.unwrap() {
            CacheLookup::Hit(cached) => assert_eq!(cached.config["max_players"], json!(30)),
            other => panic!("expected hit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_same_revision_rewrite_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let game_id = GameId::new();
        let path = store.artifact_path(&hash('a'));

        store.replace(&hash('a'), &live(game_id, 1, 10)).await.unwrap();
        let first = fs::read(&path).unwrap();

        let outcome = store.replace(&hash('a'), &live(game_id, 1, 10)).await.unwrap();
        assert_eq!(outcome, ReplaceOutcome::Written);
        assert_eq!(fs::read(&path).unwrap(), first);
    }

    #[tokio::test]
    async fn test_tombstone_blocks_stale_rebuild() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let game_id = GameId::new();

        store.replace(&hash('a'), &live(game_id, 1, 10)).await.unwrap();
        store.invalidate(&hash('a'), &game_id, 2).await.unwrap();
        assert_eq!(store.read(&hash('a')).await.unwrap(), CacheLookup::Revoked);

        // A rebuild that read the game before the rotation must not resurrect it
        let outcome = store.replace(&hash('a'), &live(game_id, 1, 10)).await.unwrap();
        assert!(matches!(outcome, ReplaceOutcome::Superseded(_)));
        assert_eq!(store.read(&hash('a')).await.unwrap(), CacheLookup::Revoked);
    }

    #[tokio::test]
    async fn test_evict_only_removes_older_live_artifacts() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let game_id = GameId::new();

        store.replace(&hash('a'), &live(game_id, 2, 10)).await.unwrap();
        assert!(!store.evict(&hash('a'), 2).await.unwrap());
        assert!(store.evict(&hash('a'), 3).await.unwrap());
        assert_eq!(store.read(&hash('a')).await.unwrap(), CacheLookup::Miss);

        store.invalidate(&hash('b'), &game_id, 1).await.unwrap();
        assert!(!store.evict(&hash('b'), 5).await.unwrap());
        assert_eq!(store.read(&hash('b')).await.unwrap(), CacheLookup::Revoked);
    }

    #[tokio::test]
    async fn test_ttl_expires_live_artifacts() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).with_ttl(Some(Duration::from_secs(60)));
        let game_id = GameId::new();

        store.replace(&hash('a'), &live(game_id, 1, 10)).await.unwrap();

        assert!(matches!(
            store.read_blocking(&hash('a'), Utc::now()).unwrap(),
            CacheLookup::Hit(_)
        ));
        assert_eq!(
            store
                .read_blocking(&hash('a'), Utc::now() + chrono::Duration::seconds(61))
                .unwrap(),
            CacheLookup::Miss
        );
    }

    #[tokio::test]
    async fn test_undecodable_artifact_is_miss_and_overwritten() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let game_id = GameId::new();

        fs::write(store.artifact_path(&hash('a')), b"{truncated").unwrap();
        assert_eq!(store.read(&hash('a')).await.unwrap(), CacheLookup::Miss);

        store.replace(&hash('a'), &live(game_id, 1, 10)).await.unwrap();
        assert!(matches!(store.read(&hash('a')).await.unwrap(), CacheLookup::Hit(_)));
    }

    #[tokio::test]
    async fn test_purge_old_tombstones_and_expired_artifacts() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir)
            .with_ttl(Some(Duration::from_secs(600)))
            .with_tombstone_retention(Duration::from_secs(60));
        let game_id = GameId::new();

        store.replace(&hash('a'), &live(game_id, 1, 10)).await.unwrap();
        store.invalidate(&hash('b'), &game_id, 1).await.unwrap();

        assert_eq!(store.purge(Utc::now()).await.unwrap(), 0);

        let later = Utc::now() + chrono::Duration::seconds(120);
        assert_eq!(store.purge(later).await.unwrap(), 1);
        assert_eq!(store.read(&hash('b')).await.unwrap(), CacheLookup::Miss);
        assert!(matches!(store.read(&hash('a')).await.unwrap(), CacheLookup::Hit(_)));

        let much_later = Utc::now() + chrono::Duration::seconds(700);
        assert!(store.purge(much_later).await.unwrap() >= 1);
        assert!(!store.artifact_path(&hash('a')).exists());
    }

    #[tokio::test]
    async fn test_concurrent_readers_never_see_partial_artifacts() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(store(&dir));
        let game_id = GameId::new();

        store.replace(&hash('a'), &live(game_id, 0, 0)).await.unwrap();

        let writer = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                for revision in 1..=50u64 {
                    store
                        .replace(&hash('a'), &live(game_id, revision, revision as i64))
                        .await
                        .unwrap();
                }
            })
        };

        let mut readers = Vec::new();
        for _ in 0..4 {
            let store = Arc::clone(&store);
            readers.push(tokio::spawn(async move {
                for _ in 0..50 {
                    match store.read(&hash('a')).await.unwrap() {
                        CacheLookup::Hit(cached) => {
                            assert_eq!(cached.config["max_players"], json!(cached.revision));
                        }
                        other => panic!("expected hit, got {:?}", other),
                    }
                }
            }));
        }

        writer.await.unwrap();
        for reader in readers {
            reader.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_ping() {
        let dir = TempDir::new().unwrap();
        assert!(store(&dir).ping().await.is_ok());
    }
}
