//! Admin session service
//!
//! Issues opaque bearer tokens after verifying the configured admin
//! credentials. Tokens are `gcs_` followed by 32 random bytes in base64url;
//! only their SHA-256 is kept.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rand::RngCore;
use tracing::{info, warn};

use super::password::PasswordHasher;
use crate::domain::session::{AdminSession, IssuedSession, SessionStore, SessionTokenHash};
use crate::domain::DomainError;
use crate::infrastructure::api_key::sha256_hex;
use crate::infrastructure::rate_limit::RateLimiter;

const TOKEN_PREFIX: &str = "gcs_";
const TOKEN_BYTES: usize = 32;

/// Configured admin account
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub username: String,
    /// Argon2 PHC string; empty disables login
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct SessionService {
    store: Arc<dyn SessionStore>,
    hasher: Arc<dyn PasswordHasher>,
    login_limiter: RateLimiter,
    credentials: AdminCredentials,
    ttl: Duration,
}

impl SessionService {
    pub fn new(
        store: Arc<dyn SessionStore>,
        hasher: Arc<dyn PasswordHasher>,
        login_limiter: RateLimiter,
        credentials: AdminCredentials,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            hasher,
            login_limiter,
            credentials,
            ttl,
        }
    }

    /// Verify credentials and issue a session
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        client_id: &str,
    ) -> Result<IssuedSession, DomainError> {
        let limit = self.login_limiter.allow(client_id).await;
        if !limit.allowed {
            warn!(client_id, "Admin login rate limited");
            return Err(DomainError::rate_limited(limit.reset_in_seconds));
        }

        if self.credentials.password_hash.is_empty() {
            warn!(client_id, "Admin login attempted while disabled");
            return Err(DomainError::unauthorized("Invalid credentials"));
        }

        // Always verify the password so unknown usernames cost the same
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();
        let stored_hash = self.credentials.password_hash.clone();
        let password_ok = tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
            .await
            .map_err(|e| DomainError::internal(format!("Password verification failed: {}", e)))?;

        let username_ok = constant_time_compare(username, &self.credentials.username);

        if !(password_ok && username_ok) {
            warn!(client_id, "Admin login failed");
            return Err(DomainError::unauthorized("Invalid credentials"));
        }

        let token = generate_token();
        let session = AdminSession::new(hash_token(&token), username, client_id, self.ttl);
        self.store.insert(session.clone()).await?;

        info!(client_id, username, "Admin logged in");

        Ok(IssuedSession { token, session })
    }

    /// Resolve a bearer token to a live session
    pub async fn authenticate(&self, token: &str) -> Result<AdminSession, DomainError> {
        if !token.starts_with(TOKEN_PREFIX) {
            return Err(DomainError::unauthorized("Invalid session"));
        }

        let token_hash = hash_token(token);

        let Some(session) = self.store.find(&token_hash).await? else {
            return Err(DomainError::unauthorized("Invalid session"));
        };

        if session.is_expired_at(Utc::now()) {
            self.store.remove(&token_hash).await?;
            return Err(DomainError::unauthorized("Session expired"));
        }

        Ok(session)
    }

    /// Revoke a session token
    pub async fn logout(&self, token: &str) -> Result<bool, DomainError> {
        let removed = self.store.remove(&hash_token(token)).await?;

        if removed {
            info!("Admin logged out");
        }

        Ok(removed)
    }

    pub async fn purge_expired(&self) -> Result<usize, DomainError> {
        self.store.purge_expired(Utc::now()).await
    }

    pub fn login_limiter(&self) -> &RateLimiter {
        &self.login_limiter
    }
}

fn generate_token() -> String {
    let mut random_bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut random_bytes);
    format!("{}{}", TOKEN_PREFIX, URL_SAFE_NO_PAD.encode(random_bytes))
}

fn hash_token(token: &str) -> SessionTokenHash {
    SessionTokenHash::new(sha256_hex(token))
}

/// Constant-time string comparison to prevent timing attacks
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rate_limit::RateLimitPolicy;
    use crate::infrastructure::rate_limit::InMemoryRateLimitStore;
    use crate::infrastructure::session::{Argon2Hasher, InMemorySessionStore};

    fn service(limit: u32, ttl_secs: i64) -> SessionService {
        let hasher = Argon2Hasher::new();
        let password_hash = hasher.hash("s3cret").unwrap();

        SessionService::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(hasher),
            RateLimiter::new(
                Arc::new(InMemoryRateLimitStore::new()),
                RateLimitPolicy::new(limit, 300),
            ),
            AdminCredentials {
                username: "admin".to_string(),
                password_hash,
            },
            Duration::seconds(ttl_secs),
        )
    }

    #[tokio::test]
    async fn test_login_and_authenticate() {
        let service = service(5, 1800);

        let issued = service.login("admin", "s3cret", "127.0.0.1").await.unwrap();
        assert!(issued.token.starts_with("gcs_"));

        let session = service.authenticate(&issued.token).await.unwrap();
        assert_eq!(session.username(), "admin");
    }

    #[tokio::test]
    async fn test_wrong_credentials_rejected() {
        let service = service(5, 1800);

        assert!(matches!(
            service.login("admin", "wrong", "127.0.0.1").await,
            Err(DomainError::Unauthorized { .. })
        ));
        assert!(matches!(
            service.login("root", "s3cret", "127.0.0.1").await,
            Err(DomainError::Unauthorized { .. })
        ));
    }

    #[tokio::test]
    async fn test_login_rate_limited() {
        let service = service(2, 1800);

        for _ in 0..2 {
            let _ = service.login("admin", "wrong", "10.0.0.9").await;
        }

        assert!(matches!(
            service.login("admin", "s3cret", "10.0.0.9").await,
            Err(DomainError::RateLimited { .. })
        ));
    }

    #[tokio::test]
    async fn test_logout_revokes() {
        let service = service(5, 1800);
        let issued = service.login("admin", "s3cret", "127.0.0.1").await.unwrap();

        assert!(service.logout(&issued.token).await.unwrap());
        assert!(service.authenticate(&issued.token).await.is_err());
        assert!(!service.logout(&issued.token).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_session_rejected() {
        let service = service(5, 0);
        let issued = service.login("admin", "s3cret", "127.0.0.1").await.unwrap();

        assert!(matches!(
            service.authenticate(&issued.token).await,
            Err(DomainError::Unauthorized { .. })
        ));
        assert_eq!(service.purge_expired().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_disabled_login() {
        let mut service = service(5, 1800);
        service.credentials.password_hash.clear();

        assert!(service.login("admin", "s3cret", "127.0.0.1").await.is_err());
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hell"));
    }
}
