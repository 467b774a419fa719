//! File-backed rate limit store
//!
//! One JSON window per client, named by the SHA-256 of the client id so
//! arbitrary identifiers map to safe file names. Read-modify-write happens
//! under an exclusive lock on the window file itself, which makes the check
//! and increment atomic across processes sharing the directory.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use tracing::warn;

use crate::domain::rate_limit::{RateLimitPolicy, RateLimitResult, RateLimitStore, RateLimitWindow};
use crate::domain::DomainError;
use crate::infrastructure::api_key::sha256_hex;

const WINDOW_EXT: &str = "json";

#[derive(Debug, Clone)]
pub struct FileRateLimitStore {
    directory: PathBuf,
    /// Namespace so several policies can share one directory
    scope: String,
}

impl FileRateLimitStore {
    pub fn new(directory: impl Into<PathBuf>, scope: impl Into<String>) -> Result<Self, DomainError> {
        let directory = directory.into();

        fs::create_dir_all(&directory).map_err(|e| {
            DomainError::storage(format!(
                "Failed to create rate limit directory {}: {}",
                directory.display(),
                e
            ))
        })?;

        Ok(Self {
            directory,
            scope: scope.into(),
        })
    }

    fn window_path(&self, client_id: &str) -> PathBuf {
        let name = sha256_hex(&format!("{}:{}", self.scope, client_id));
        self.directory.join(format!("{}-{}.{}", self.scope, name, WINDOW_EXT))
    }

    fn hit_blocking(
        &self,
        client_id: &str,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> Result<RateLimitResult, DomainError> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.window_path(client_id))
            .map_err(|e| DomainError::storage(format!("Failed to open rate limit file: {}", e)))?;

        FileExt::lock_exclusive(&file)
            .map_err(|e| DomainError::storage(format!("Failed to lock rate limit file: {}", e)))?;

        let result = update_window(&mut file, policy, now);
        let _ = FileExt::unlock(&file);

        result
    }

    fn purge_blocking(&self, window_secs: u64, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let prefix = format!("{}-", self.scope);
        let entries = fs::read_dir(&self.directory)
            .map_err(|e| DomainError::storage(format!("Failed to read rate limit directory: {}", e)))?;

        let mut removed = 0;

        for entry in entries.flatten() {
            let path = entry.path();
            let is_window = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(WINDOW_EXT));

            if !is_window {
                continue;
            }

            match purge_window(&path, window_secs, now) {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to purge rate limit file"),
            }
        }

        Ok(removed)
    }
}

#[async_trait]
impl RateLimitStore for FileRateLimitStore {
    async fn hit(
        &self,
        client_id: &str,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> Result<RateLimitResult, DomainError> {
        let store = self.clone();
        let client_id = client_id.to_string();
        let policy = *policy;

        tokio::task::spawn_blocking(move || store.hit_blocking(&client_id, &policy, now))
            .await
            .map_err(|e| DomainError::internal(format!("Rate limit task failed: {}", e)))?
    }

    async fn purge(&self, window_secs: u64, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let store = self.clone();

        tokio::task::spawn_blocking(move || store.purge_blocking(window_secs, now))
            .await
            .map_err(|e| DomainError::internal(format!("Rate limit task failed: {}", e)))?
    }
}

/// Read the window, count the request and write it back in place
fn update_window(
    file: &mut File,
    policy: &RateLimitPolicy,
    now: DateTime<Utc>,
) -> Result<RateLimitResult, DomainError> {
    let mut window = read_window(file)?.unwrap_or_else(|| RateLimitWindow::start(now));
    let result = window.hit(policy, now);

    let bytes = serde_json::to_vec(&window)
        .map_err(|e| DomainError::internal(format!("Failed to serialize rate limit window: {}", e)))?;

    file.set_len(0)
        .and_then(|_| file.seek(SeekFrom::Start(0)))
        .and_then(|_| file.write_all(&bytes))
        .map_err(|e| DomainError::storage(format!("Failed to write rate limit file: {}", e)))?;

    Ok(result)
}

/// Decode the window; an empty or corrupt file starts a fresh window
fn read_window(file: &mut File) -> Result<Option<RateLimitWindow>, DomainError> {
    let mut contents = Vec::new();
    file.seek(SeekFrom::Start(0))
        .and_then(|_| file.read_to_end(&mut contents))
        .map_err(|e| DomainError::storage(format!("Failed to read rate limit file: {}", e)))?;

    if contents.is_empty() {
        return Ok(None);
    }

    Ok(serde_json::from_slice(&contents).ok())
}

fn purge_window(path: &Path, window_secs: u64, now: DateTime<Utc>) -> Result<bool, DomainError> {
    let mut file = match OpenOptions::new().read(true).write(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(DomainError::storage(format!("Failed to open rate limit file: {}", e))),
    };

    // Skip windows currently being updated
    if FileExt::try_lock_exclusive(&file).is_err() {
        return Ok(false);
    }

    let stale = read_window(&mut file)?.is_none_or(|w| w.is_stale(window_secs, now));

    if stale {
        fs::remove_file(path)
            .map_err(|e| DomainError::storage(format!("Failed to remove rate limit file: {}", e)))?;
    }

    let _ = FileExt::unlock(&file);
    Ok(stale)
}
