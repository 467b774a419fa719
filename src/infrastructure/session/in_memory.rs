//! In-memory session store

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::session::{AdminSession, SessionStore, SessionTokenHash};
use crate::domain::DomainError;

/// Process-local admin sessions, lost on restart
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionTokenHash, AdminSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, session: AdminSession) -> Result<(), DomainError> {
        self.sessions
            .write()
            .await
            .insert(session.token_hash().clone(), session);
        Ok(())
    }

    async fn find(
        &self,
        token_hash: &SessionTokenHash,
    ) -> Result<Option<AdminSession>, DomainError> {
        Ok(self.sessions.read().await.get(token_hash).cloned())
    }

    async fn remove(&self, token_hash: &SessionTokenHash) -> Result<bool, DomainError> {
        Ok(self.sessions.write().await.remove(token_hash).is_some())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|_, s| !s.is_expired_at(now));

        Ok(before - sessions.len())
    }
}
