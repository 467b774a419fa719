//! API key generation and hashing
//!
//! Generates cryptographically secure API keys and derives the digest used
//! as store lookup value and cache artifact name.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::domain::api_key::{
    ApiKeyValidationError, GeneratedApiKey, KeyHash, validate_api_key_syntax,
};
use crate::domain::DomainError;

/// Prefix of every generated key
pub const API_KEY_PREFIX: &str = "gc_";

const KEY_BYTES: usize = 32;

/// Codec for raw API keys
#[derive(Debug, Clone)]
pub struct KeyCodec {
    prefix: String,
    key_bytes: usize,
}

impl KeyCodec {
    pub fn new() -> Self {
        Self {
            prefix: API_KEY_PREFIX.to_string(),
            key_bytes: KEY_BYTES,
        }
    }

    /// Generate a new random API key
    pub fn generate(&self) -> Result<GeneratedApiKey, DomainError> {
        let mut random_bytes = vec![0u8; self.key_bytes];
        rand::thread_rng().fill_bytes(&mut random_bytes);

        let key = format!("{}{}", self.prefix, URL_SAFE_NO_PAD.encode(&random_bytes));
        let hash = self.derive_lookup_hash(&key)?;

        Ok(GeneratedApiKey { key, hash })
    }

    /// Check the raw key shape before any I/O
    pub fn validate_syntax(&self, raw_key: &str) -> Result<(), ApiKeyValidationError> {
        validate_api_key_syntax(raw_key)
    }

    /// Hex SHA-256 of the raw key
    pub fn derive_lookup_hash(&self, raw_key: &str) -> Result<KeyHash, DomainError> {
        KeyHash::new(sha256_hex(raw_key))
    }

    /// Validate then hash, collapsing syntax errors into `InvalidKeyFormat`
    pub fn parse(&self, raw_key: &str) -> Result<KeyHash, DomainError> {
        self.validate_syntax(raw_key)
            .map_err(|_| DomainError::InvalidKeyFormat)?;
        self.derive_lookup_hash(raw_key)
    }
}

impl Default for KeyCodec {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercase hex SHA-256 of a string
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_key() {
        let codec = KeyCodec::new();
        let generated = codec.generate().unwrap();

        assert!(generated.key.starts_with("gc_"));
        // 32 bytes base64-encoded = 43 chars, plus prefix
        assert_eq!(generated.key.len(), 46);
        assert!(codec.validate_syntax(&generated.key).is_ok());
        assert_eq!(generated.hash, codec.derive_lookup_hash(&generated.key).unwrap());
    }

    #[test]
    fn test_key_uniqueness() {
        let codec = KeyCodec::new();
        let key1 = codec.generate().unwrap();
        let key2 = codec.generate().unwrap();

        assert_ne!(key1.key, key2.key);
        assert_ne!(key1.hash, key2.hash);
    }

    #[test]
    fn test_hash_deterministic() {
        let codec = KeyCodec::new();
        let key = "gc_test_key_1234567890";

        assert_eq!(
            codec.derive_lookup_hash(key).unwrap(),
            codec.derive_lookup_hash(key).unwrap()
        );
        assert_eq!(codec.derive_lookup_hash(key).unwrap().as_str().len(), 64);
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let codec = KeyCodec::new();

        assert!(matches!(
            codec.parse("short"),
            Err(DomainError::InvalidKeyFormat)
        ));
        assert!(matches!(
            codec.parse("gc_has spaces in the key!!"),
            Err(DomainError::InvalidKeyFormat)
        ));
        assert!(codec.parse("gc_abcdefghijklmnop").is_ok());
    }
}
