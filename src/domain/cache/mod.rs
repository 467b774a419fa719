//! Cache domain - materialized configuration snapshots keyed by API key hash

mod artifact;
mod repository;

pub use artifact::{CacheArtifact, CacheLookup, CachedConfig, ReplaceOutcome};
pub use repository::ArtifactStore;
