//! Admin session entity

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Hex SHA-256 digest of a session token
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionTokenHash(String);

impl SessionTokenHash {
    pub fn new(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An authenticated admin actor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSession {
    token_hash: SessionTokenHash,
    username: String,
    client_id: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl AdminSession {
    pub fn new(
        token_hash: SessionTokenHash,
        username: impl Into<String>,
        client_id: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            token_hash,
            username: username.into(),
            client_id: client_id.into(),
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn token_hash(&self) -> &SessionTokenHash {
        &self.token_hash
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// A freshly issued session together with its raw token
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// Raw bearer token, returned to the client once
    pub token: String,
    pub session: AdminSession,
}
