//! Rate limit store trait

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::entity::{RateLimitPolicy, RateLimitResult};
use crate::domain::DomainError;

/// Storage of per-client rate limit windows
#[async_trait]
pub trait RateLimitStore: Send + Sync + Debug {
    /// Check and count one request for a client
    ///
    /// The check and the increment must be atomic with respect to other
    /// workers sharing the store.
    async fn hit(
        &self,
        client_id: &str,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> Result<RateLimitResult, DomainError>;

    /// Drop windows idle for longer than twice `window_secs`
    async fn purge(&self, window_secs: u64, now: DateTime<Utc>) -> Result<usize, DomainError>;
}
