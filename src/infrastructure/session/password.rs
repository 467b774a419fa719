//! Admin password hashing with Argon2 PHC strings

use std::fmt::Debug;

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use crate::domain::DomainError;

/// Hashes and checks the admin password
pub trait PasswordHasher: Send + Sync + Debug {
    /// Hash a password into a PHC string
    fn hash(&self, password: &str) -> Result<String, DomainError>;

    /// Check a password against a PHC string; malformed strings never match
    fn verify(&self, password: &str, phc: &str) -> bool;
}

/// Argon2id with the crate's default parameters
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher;

impl Argon2Hasher {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, DomainError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|phc| phc.to_string())
            .map_err(|e| DomainError::internal(format!("Failed to hash password: {}", e)))
    }

    fn verify(&self, password: &str, phc: &str) -> bool {
        PasswordHash::new(phc).is_ok_and(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
    }
}

/// Whether a configured `admin.password_hash` parses as a PHC string
pub fn is_phc_string(value: &str) -> bool {
    PasswordHash::new(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_password_round_trip() {
        let hasher = Argon2Hasher::new();
        let phc = hasher.hash("correct horse").unwrap();

        assert!(phc.starts_with("$argon2id$"));
        assert!(is_phc_string(&phc));
        assert!(hasher.verify("correct horse", &phc));
        assert!(!hasher.verify("battery staple", &phc));
    }

    #[test]
    fn test_unset_or_garbage_hash_never_verifies() {
        let hasher = Argon2Hasher::new();

        assert!(!hasher.verify("", ""));
        assert!(!hasher.verify("password", "plaintext-password"));
        assert!(!is_phc_string("plaintext-password"));
    }
}
