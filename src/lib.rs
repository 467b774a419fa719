//! Game Configuration Service
//!
//! Serves per-game key/value configuration to game clients that present an
//! API key, with:
//! - Hashed API keys that are only shown once, at creation or rotation
//! - A file-backed configuration cache rebuilt on every admin write
//! - Fail-open fixed window rate limiting
//! - An admin API behind session tokens

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::ConfigStore;
use infrastructure::{
    api_key::KeyCodec,
    cache::{ConfigCache, FileArtifactStore},
    maintenance::Sweeper,
    rate_limit::RateLimiter,
    services::{AdminService, ConfigService},
    session::{
        is_phc_string, AdminCredentials, Argon2Hasher, InMemorySessionStore, SessionService,
    },
    store::create_config_store,
};
use tracing::{info, warn};

/// Create the application state on the configured store
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let store = create_config_store(&config.storage).await?;
    build_app_state(config, store)
}

/// Wire every service around an existing store
pub fn build_app_state(config: &AppConfig, store: Arc<dyn ConfigStore>) -> anyhow::Result<AppState> {
    let artifacts = FileArtifactStore::new(config.cache.directory.clone())?
        .with_ttl(config.cache.ttl_secs.map(std::time::Duration::from_secs))
        .with_tombstone_retention(std::time::Duration::from_secs(
            config.cache.tombstone_retention_secs,
        ));
    info!(directory = %config.cache.directory.display(), "Configuration cache ready");

    let cache = ConfigCache::new(store.clone(), Arc::new(artifacts));
    let codec = KeyCodec::new();

    let public_limiter = RateLimiter::from_backend(
        config.rate_limit.backend,
        &config.rate_limit.directory,
        "public",
        config.rate_limit.public,
    )?;
    let login_limiter = RateLimiter::from_backend(
        config.rate_limit.backend,
        &config.rate_limit.directory,
        "admin_login",
        config.rate_limit.admin_login,
    )?;
    info!(backend = ?config.rate_limit.backend, "Rate limiting ready");

    if config.admin.password_hash.is_empty() {
        warn!("admin.password_hash is not set; admin login is disabled");
    } else if !is_phc_string(&config.admin.password_hash) {
        warn!("admin.password_hash is not an Argon2 PHC string; admin login will always fail");
    }

    let session_service = SessionService::new(
        Arc::new(InMemorySessionStore::new()),
        Arc::new(Argon2Hasher::new()),
        login_limiter,
        AdminCredentials {
            username: config.admin.username.clone(),
            password_hash: config.admin.password_hash.clone(),
        },
        chrono::Duration::seconds(i64::try_from(config.admin.session_ttl_secs).unwrap_or(i64::MAX)),
    );

    let config_service = ConfigService::new(
        codec.clone(),
        store.clone(),
        cache.clone(),
        public_limiter,
        config.limits.max_value_bytes,
    );
    let admin_service = AdminService::new(codec, store.clone(), cache.clone(), config.limits);

    Ok(AppState {
        config_service,
        admin_service,
        session_service,
        store,
        cache,
        trust_forwarded_for: config.server.trust_forwarded_for,
    })
}

/// Sweeper over the state's cache, rate limiters and sessions
pub fn create_sweeper(state: &AppState) -> Sweeper {
    Sweeper::new(
        state.cache.clone(),
        vec![
            state.config_service.limiter().clone(),
            state.session_service.login_limiter().clone(),
        ],
        state.session_service.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use crate::config::RateLimitBackend;
    use crate::infrastructure::store::InMemoryConfigStore;

    #[tokio::test]
    async fn test_build_app_state_on_temp_dirs() {
        let dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.cache.directory = dir.path().join("cache");
        config.rate_limit.directory = dir.path().join("rate_limit");
        config.rate_limit.backend = RateLimitBackend::File;

        let state = build_app_state(&config, Arc::new(InMemoryConfigStore::new())).unwrap();

        assert!(dir.path().join("cache").is_dir());
        assert!(state.cache.ping().await.is_ok());
        assert_eq!(state.config_service.limiter().policy().limit, 60);

        let report = create_sweeper(&state).sweep_once().await;
        assert_eq!(report.artifacts, 0);
    }
}
