//! API key hash and generated key types

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

const KEY_HASH_LENGTH: usize = 64;

/// Digest of a raw API key - 64 lowercase hex characters (SHA-256)
///
/// Used both as the indexed store lookup value and as the cache artifact
/// file name, so it is restricted to a filename-safe alphabet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyHash(String);

impl KeyHash {
    /// Wrap an existing digest after validating its shape
    pub fn new(hash: impl Into<String>) -> Result<Self, DomainError> {
        let hash = hash.into();

        let well_formed = hash.len() == KEY_HASH_LENGTH
            && hash
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));

        if !well_formed {
            return Err(DomainError::internal("Malformed API key hash"));
        }

        Ok(Self(hash))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Prefix safe to put in logs
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl TryFrom<String> for KeyHash {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<KeyHash> for String {
    fn from(hash: KeyHash) -> Self {
        hash.0
    }
}

impl std::fmt::Display for KeyHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of generating a new API key
#[derive(Debug, Clone)]
pub struct GeneratedApiKey {
    /// The raw key (only shown once at creation)
    pub key: String,
    /// The digest that gets persisted
    pub hash: KeyHash,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_hash_valid() {
        let hash = KeyHash::new("a".repeat(64)).unwrap();
        assert_eq!(hash.short(), "aaaaaaaa");
    }

    #[test]
    fn test_key_hash_rejects_bad_shape() {
        assert!(KeyHash::new("abc").is_err());
        assert!(KeyHash::new("A".repeat(64)).is_err());
        assert!(KeyHash::new(format!("{}/", "a".repeat(63))).is_err());
    }

    #[test]
    fn test_key_hash_serde() {
        let hash = KeyHash::new("0123456789abcdef".repeat(4)).unwrap();
        let json = serde_json::to_string(&hash).unwrap();
        let back: KeyHash = serde_json::from_str(&json).unwrap();
        assert_eq!(hash, back);

        assert!(serde_json::from_str::<KeyHash>("\"not-a-hash\"").is_err());
    }
}
