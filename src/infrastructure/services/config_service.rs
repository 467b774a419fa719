//! Config service - public configuration retrieval
//!
//! Runs one request through rate limiting, key validation, the cache and, on
//! a miss, the store followed by a cache rebuild.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::domain::config_entry::content_filter::sanitize_value;
use crate::domain::config_entry::value_size;
use crate::domain::{
    CacheLookup, CachedConfig, ConfigKey, ConfigStore, DomainError, KeyHash, RateLimitResult,
};
use crate::infrastructure::api_key::KeyCodec;
use crate::infrastructure::cache::ConfigCache;
use crate::infrastructure::rate_limit::RateLimiter;

/// Request for a game's configuration
#[derive(Debug, Clone)]
pub struct ConfigRequest {
    /// Identifier the rate limiter counts against, usually the client IP
    pub client_id: String,
    pub raw_key: Option<String>,
    /// Restrict the response to a single key
    pub only_key: Option<ConfigKey>,
}

/// Filtered configuration plus the rate limit state after this request
#[derive(Debug, Clone)]
pub struct ConfigResponse {
    pub config: BTreeMap<String, Value>,
    pub rate_limit: RateLimitResult,
}

/// Where a served configuration came from
#[derive(Debug, Clone, Copy)]
enum Source {
    Cache,
    Rebuild,
    Store,
}

impl Source {
    fn as_str(self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Rebuild => "rebuild",
            Self::Store => "store",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigService {
    codec: KeyCodec,
    store: Arc<dyn ConfigStore>,
    cache: ConfigCache,
    limiter: RateLimiter,
    max_value_bytes: usize,
}

impl ConfigService {
    pub fn new(
        codec: KeyCodec,
        store: Arc<dyn ConfigStore>,
        cache: ConfigCache,
        limiter: RateLimiter,
        max_value_bytes: usize,
    ) -> Self {
        Self {
            codec,
            store,
            cache,
            limiter,
            max_value_bytes,
        }
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Serve a configuration request
    pub async fn fetch(&self, request: ConfigRequest) -> Result<ConfigResponse, DomainError> {
        let rate_limit = self.limiter.allow(&request.client_id).await;
        if !rate_limit.allowed {
            debug!(client_id = %request.client_id, "Config request rate limited");
            return Err(DomainError::rate_limited(rate_limit.reset_in_seconds));
        }

        let raw_key = request
            .raw_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| DomainError::unauthorized("Missing API key"))?;

        let hash = self.codec.parse(raw_key)?;

        let (cached, source) = self.resolve(&hash).await?;

        info!(
            client_id = %request.client_id,
            game_id = %cached.game_id,
            key_hash = hash.short(),
            revision = cached.revision,
            source = source.as_str(),
            "Served configuration"
        );

        let mut config = self.filter(cached);

        if let Some(key) = request.only_key {
            let value = config.remove(key.as_str()).ok_or_else(|| {
                DomainError::config_not_found(format!("Configuration key '{}' not found", key))
            })?;
            config = BTreeMap::from([(key.as_str().to_string(), value)]);
        }

        Ok(ConfigResponse { config, rate_limit })
    }

    async fn resolve(&self, hash: &KeyHash) -> Result<(CachedConfig, Source), DomainError> {
        match self.cache.lookup(hash).await {
            Ok(CacheLookup::Hit(cached)) => return Ok((cached, Source::Cache)),
            Ok(CacheLookup::Revoked) => {
                debug!(key_hash = hash.short(), "Presented key hash is revoked");
                return Err(DomainError::unauthorized("API key revoked"));
            }
            Ok(CacheLookup::Miss) => {}
            Err(e) => warn!(key_hash = hash.short(), error = %e, "Cache lookup failed, using store"),
        }

        let game = self
            .store
            .find_active_game_by_key_hash(hash)
            .await?
            .ok_or_else(|| DomainError::unauthorized("Unknown API key"))?;

        match self.cache.rebuild(game.id()).await {
            Ok(Some(cached)) if &cached.key_hash == hash => Ok((cached, Source::Rebuild)),
            Ok(_) => {
                debug!(game_id = %game.id(), "Game changed during rebuild");
                Err(DomainError::unauthorized("Unknown API key"))
            }
            Err(e @ DomainError::Cache { .. }) => {
                error!(game_id = %game.id(), error = %e, "Cache rebuild failed, serving from store");
                Ok((self.cache.materialize(&game).await?, Source::Store))
            }
            Err(e) => Err(e),
        }
    }

    /// Sanitize values and drop any that exceed the size bound
    ///
    /// Size is measured as on write, so only values that outgrew a lowered
    /// bound are dropped.
    fn filter(&self, cached: CachedConfig) -> BTreeMap<String, Value> {
        let game_id = cached.game_id;

        cached
            .config
            .into_iter()
            .filter_map(|(key, value)| {
                let value = sanitize_value(value);
                let size = value_size(&value);

                if size > self.max_value_bytes {
                    warn!(
                        game_id = %game_id,
                        key = %key,
                        size,
                        max = self.max_value_bytes,
                        "Dropping oversized configuration value"
                    );
                    return None;
                }

                Some((key, value))
            })
            .collect()
    }
}
