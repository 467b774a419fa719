//! Background sweeper for expired cache, rate limit and session state

use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::infrastructure::cache::ConfigCache;
use crate::infrastructure::rate_limit::RateLimiter;
use crate::infrastructure::session::SessionService;

/// Counts removed by one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub artifacts: usize,
    pub rate_limit_windows: usize,
    pub sessions: usize,
}

#[derive(Debug, Clone)]
pub struct Sweeper {
    cache: ConfigCache,
    limiters: Vec<RateLimiter>,
    sessions: SessionService,
}

impl Sweeper {
    pub fn new(cache: ConfigCache, limiters: Vec<RateLimiter>, sessions: SessionService) -> Self {
        Self {
            cache,
            limiters,
            sessions,
        }
    }

    /// Run one sweep; failures are logged and counted as nothing removed
    pub async fn sweep_once(&self) -> SweepReport {
        let mut report = SweepReport::default();

        match self.cache.purge(Utc::now()).await {
            Ok(n) => report.artifacts = n,
            Err(e) => warn!(error = %e, "Cache purge failed"),
        }

        for limiter in &self.limiters {
            match limiter.purge().await {
                Ok(n) => report.rate_limit_windows += n,
                Err(e) => warn!(error = %e, "Rate limit purge failed"),
            }
        }

        match self.sessions.purge_expired().await {
            Ok(n) => report.sessions = n,
            Err(e) => warn!(error = %e, "Session purge failed"),
        }

        debug!(
            artifacts = report.artifacts,
            rate_limit_windows = report.rate_limit_windows,
            sessions = report.sessions,
            "Maintenance sweep finished"
        );

        report
    }

    /// Sweep every `period` until `shutdown` flips to true
    pub async fn run(self, period: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval_secs = period.as_secs(), "Maintenance sweeper started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Maintenance sweeper shutting down");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.sweep_once().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    use crate::domain::{ArtifactStore, GameId, KeyHash, RateLimitPolicy};
    use crate::infrastructure::cache::FileArtifactStore;
    use crate::infrastructure::rate_limit::InMemoryRateLimitStore;
    use crate::infrastructure::session::{
        AdminCredentials, Argon2Hasher, InMemorySessionStore,
    };
    use crate::infrastructure::store::InMemoryConfigStore;

    fn sweeper(dir: &TempDir, retention: Duration) -> (Sweeper, Arc<FileArtifactStore>) {
        let artifacts = Arc::new(
            FileArtifactStore::new(dir.path())
                .unwrap()
                .with_tombstone_retention(retention),
        );
        let cache = ConfigCache::new(Arc::new(InMemoryConfigStore::new()), artifacts.clone());
        let limiter = RateLimiter::new(
            Arc::new(InMemoryRateLimitStore::new()),
            RateLimitPolicy::new(5, 60),
        );
        let sessions = SessionService::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(Argon2Hasher::new()),
            limiter.clone(),
            AdminCredentials {
                username: "admin".to_string(),
                password_hash: String::new(),
            },
            chrono::Duration::minutes(30),
        );

        (Sweeper::new(cache, vec![limiter], sessions), artifacts)
    }

    #[tokio::test]
    async fn test_sweep_removes_old_tombstones() {
        let dir = TempDir::new().unwrap();
        let (sweeper, artifacts) = sweeper(&dir, Duration::ZERO);

        let hash = KeyHash::new("a".repeat(64)).unwrap();
        artifacts.invalidate(&hash, &GameId::new(), 1).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let report = sweeper.sweep_once().await;
        assert_eq!(report.artifacts, 1);
        assert_eq!(report.sessions, 0);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let dir = TempDir::new().unwrap();
        let (sweeper, _) = sweeper(&dir, Duration::from_secs(3600));
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(sweeper.run(Duration::from_millis(10), rx));
        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
