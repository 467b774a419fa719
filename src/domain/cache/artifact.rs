//! Cache artifact types

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::api_key::KeyHash;
use crate::domain::game::GameId;

/// Materialized configuration snapshot of one game
///
/// A pure function of the store state at rebuild time. `BTreeMap` keeps the
/// serialized form deterministic so repeated rebuilds are byte-identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CacheArtifact {
    /// Resolved key/value mapping of an active game
    Live {
        game_id: GameId,
        revision: u64,
        config: BTreeMap<String, Value>,
    },
    /// Tombstone for a hash that must no longer resolve
    Revoked { game_id: GameId, revision: u64 },
}

impl CacheArtifact {
    pub fn revision(&self) -> u64 {
        match self {
            Self::Live { revision, .. } | Self::Revoked { revision, .. } => *revision,
        }
    }

    pub fn game_id(&self) -> &GameId {
        match self {
            Self::Live { game_id, .. } | Self::Revoked { game_id, .. } => game_id,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live { .. })
    }
}

/// Result of reading the artifact for a key hash
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Hit(CachedConfig),
    /// A tombstone: the hash was rotated away, deleted or deactivated
    Revoked,
    Miss,
}

/// Live configuration served from the cache
#[derive(Debug, Clone, PartialEq)]
pub struct CachedConfig {
    pub key_hash: KeyHash,
    pub game_id: GameId,
    pub revision: u64,
    pub config: BTreeMap<String, Value>,
}

impl CachedConfig {
    /// Extract the live payload of an artifact
    pub fn from_artifact(key_hash: KeyHash, artifact: CacheArtifact) -> Option<Self> {
        match artifact {
            CacheArtifact::Live {
                game_id,
                revision,
                config,
            } => Some(Self {
                key_hash,
                game_id,
                revision,
                config,
            }),
            CacheArtifact::Revoked { .. } => None,
        }
    }
}

/// Outcome of an atomic replace
#[derive(Debug, Clone, PartialEq)]
pub enum ReplaceOutcome {
    /// The candidate is now the artifact on disk
    Written,
    /// A newer artifact was already present and is kept
    Superseded(CacheArtifact),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_artifact_serialization_is_tagged() {
        let game_id = GameId::new();
        let artifact = CacheArtifact::Revoked {
            game_id,
            revision: 4,
        };

        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["state"], "revoked");
        assert_eq!(json["revision"], 4);
    }

    #[test]
    fn test_live_artifact_deterministic_bytes() {
        let game_id = GameId::new();
        let mut a = BTreeMap::new();
        a.insert("zeta".to_string(), json!(1));
        a.insert("alpha".to_string(), json!("x"));

        let mut b = BTreeMap::new();
        b.insert("alpha".to_string(), json!("x"));
        b.insert("zeta".to_string(), json!(1));

        let first = CacheArtifact::Live {
            game_id,
            revision: 2,
            config: a,
        };
        let second = CacheArtifact::Live {
            game_id,
            revision: 2,
            config: b,
        };

        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[test]
    fn test_cached_config_from_tombstone() {
        let hash = KeyHash::new("c".repeat(64)).unwrap();
        let tombstone = CacheArtifact::Revoked {
            game_id: GameId::new(),
            revision: 1,
        };

        assert!(CachedConfig::from_artifact(hash, tombstone).is_none());
    }
}
