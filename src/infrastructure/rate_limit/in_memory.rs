//! In-memory rate limit store

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::rate_limit::{RateLimitPolicy, RateLimitResult, RateLimitStore, RateLimitWindow};
use crate::domain::DomainError;

/// Process-local rate limit windows
///
/// Only suitable for a single instance; counters are not shared across
/// processes and are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    windows: Mutex<HashMap<String, RateLimitWindow>>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn hit(
        &self,
        client_id: &str,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> Result<RateLimitResult, DomainError> {
        let mut windows = self.windows.lock().await;
        let window = windows
            .entry(client_id.to_string())
            .or_insert_with(|| RateLimitWindow::start(now));

        Ok(window.hit(policy, now))
    }

    async fn purge(&self, window_secs: u64, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let mut windows = self.windows.lock().await;
        let before = windows.len();

        windows.retain(|_, w| !w.is_stale(window_secs, now));

        Ok(before - windows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_limit_and_reset() {
        let store = InMemoryRateLimitStore::new();
        let policy = RateLimitPolicy::new(2, 60);
        let now = Utc::now();

        assert!(store.hit("key1", &policy, now).await.unwrap().allowed);
        assert!(store.hit("key1", &policy, now).await.unwrap().allowed);
        assert!(!store.hit("key1", &policy, now).await.unwrap().allowed);

        // Different client should still be allowed
        assert!(store.hit("key2", &policy, now).await.unwrap().allowed);

        let later = now + Duration::seconds(61);
        assert!(store.hit("key1", &policy, later).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_purge() {
        let store = InMemoryRateLimitStore::new();
        let policy = RateLimitPolicy::new(2, 60);
        let now = Utc::now();

        store.hit("key1", &policy, now).await.unwrap();
        store.hit("key2", &policy, now + Duration::seconds(100)).await.unwrap();

        assert_eq!(store.purge(60, now + Duration::seconds(150)).await.unwrap(), 1);
    }
}
