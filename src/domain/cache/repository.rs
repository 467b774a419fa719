//! Artifact store trait definition

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::artifact::{CacheArtifact, CacheLookup, ReplaceOutcome};
use crate::domain::api_key::KeyHash;
use crate::domain::game::GameId;
use crate::domain::DomainError;

/// Storage of cache artifacts, one per key hash
///
/// Readers never lock. Writers replace whole artifacts atomically so a
/// reader observes either the previous artifact or the new one, never a
/// partial write.
#[async_trait]
pub trait ArtifactStore: Send + Sync + Debug {
    /// Read the artifact for a hash
    async fn read(&self, hash: &KeyHash) -> Result<CacheLookup, DomainError>;

    /// Atomically replace the artifact for a hash
    ///
    /// A candidate whose revision is lower than the stored artifact's is
    /// discarded and the stored one is returned instead.
    async fn replace(
        &self,
        hash: &KeyHash,
        artifact: &CacheArtifact,
    ) -> Result<ReplaceOutcome, DomainError>;

    /// Make a hash unresolvable by writing a tombstone at `revision`
    async fn invalidate(
        &self,
        hash: &KeyHash,
        game_id: &GameId,
        revision: u64,
    ) -> Result<(), DomainError> {
        let tombstone = CacheArtifact::Revoked {
            game_id: *game_id,
            revision,
        };
        self.replace(hash, &tombstone).await.map(|_| ())
    }

    /// Remove the artifact for a hash if its revision is below `revision`
    ///
    /// Returns whether an artifact was removed. Tombstones are kept.
    async fn evict(&self, hash: &KeyHash, revision: u64) -> Result<bool, DomainError>;

    /// Remove expired artifacts and old tombstones, returning the count
    async fn purge(&self, now: DateTime<Utc>) -> Result<usize, DomainError>;

    /// Check that the backing storage is usable
    async fn ping(&self) -> Result<(), DomainError>;
}
