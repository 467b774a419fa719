//! Fail-open rate limiter

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use super::file::FileRateLimitStore;
use super::in_memory::InMemoryRateLimitStore;
use crate::config::RateLimitBackend;
use crate::domain::rate_limit::{RateLimitPolicy, RateLimitResult, RateLimitStore};
use crate::domain::DomainError;

/// Fixed window rate limiter for one policy
///
/// Availability wins over strict throttling: when the store fails the request
/// is allowed and the failure logged.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    policy: RateLimitPolicy,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>, policy: RateLimitPolicy) -> Self {
        Self { store, policy }
    }

    /// Build a limiter on the configured backend
    pub fn from_backend(
        backend: RateLimitBackend,
        directory: &Path,
        scope: &str,
        policy: RateLimitPolicy,
    ) -> Result<Self, DomainError> {
        let store: Arc<dyn RateLimitStore> = match backend {
            RateLimitBackend::File => Arc::new(FileRateLimitStore::new(directory, scope)?),
            RateLimitBackend::Memory => Arc::new(InMemoryRateLimitStore::new()),
        };

        Ok(Self::new(store, policy))
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Check and count one request from a client
    pub async fn allow(&self, client_id: &str) -> RateLimitResult {
        match self.store.hit(client_id, &self.policy, Utc::now()).await {
            Ok(result) => result,
            Err(e) => {
                warn!(client_id, error = %e, "Rate limit store unavailable, allowing request");
                RateLimitResult::fail_open(&self.policy)
            }
        }
    }

    /// Forget idle windows
    pub async fn purge(&self) -> Result<usize, DomainError> {
        self.store.purge(self.policy.window_secs, Utc::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    #[derive(Debug)]
    struct BrokenStore;

    #[async_trait]
    impl RateLimitStore for BrokenStore {
        async fn hit(
            &self,
            _client_id: &str,
            _policy: &RateLimitPolicy,
            _now: DateTime<Utc>,
        ) -> Result<RateLimitResult, DomainError> {
            Err(DomainError::storage("disk unavailable"))
        }

        async fn purge(&self, _window_secs: u64, _now: DateTime<Utc>) -> Result<usize, DomainError> {
            Err(DomainError::storage("disk unavailable"))
        }
    }

    #[tokio::test]
    async fn test_fails_open() {
        let limiter = RateLimiter::new(Arc::new(BrokenStore), RateLimitPolicy::new(1, 60));

        for _ in 0..5 {
            assert!(limiter.allow("10.0.0.1").await.allowed);
        }
    }

    #[tokio::test]
    async fn test_enforces_policy() {
        let limiter = RateLimiter::new(
            Arc::new(InMemoryRateLimitStore::new()),
            RateLimitPolicy::new(2, 60),
        );

        assert!(limiter.allow("10.0.0.1").await.allowed);
        assert!(limiter.allow("10.0.0.1").await.allowed);

        let result = limiter.allow("10.0.0.1").await;
        assert!(!result.allowed);
        assert_eq!(result.limit, 2);
        assert!(result.reset_in_seconds <= 60);
    }

    #[tokio::test]
    async fn test_file_backend() {
        let dir = tempfile::TempDir::new().unwrap();
        let limiter = RateLimiter::from_backend(
            RateLimitBackend::File,
            dir.path(),
            "public",
            RateLimitPolicy::new(1, 60),
        )
        .unwrap();

        assert!(limiter.allow("a").await.allowed);
        assert!(!limiter.allow("a").await.allowed);
    }
}
