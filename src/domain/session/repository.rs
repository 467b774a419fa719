//! Session store trait

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::entity::{AdminSession, SessionTokenHash};
use crate::domain::DomainError;

#[async_trait]
pub trait SessionStore: Send + Sync + Debug {
    async fn insert(&self, session: AdminSession) -> Result<(), DomainError>;

    /// Find a session by token digest, expired or not
    async fn find(&self, token_hash: &SessionTokenHash)
    -> Result<Option<AdminSession>, DomainError>;

    /// Remove a session, returning whether it existed
    async fn remove(&self, token_hash: &SessionTokenHash) -> Result<bool, DomainError>;

    /// Remove every session expired at `now`
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, DomainError>;
}
