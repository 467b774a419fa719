//! Domain layer - Core business logic and entities

pub mod api_key;
pub mod cache;
pub mod config_entry;
pub mod error;
pub mod game;
pub mod rate_limit;
pub mod session;

pub use api_key::{ApiKeyValidationError, GeneratedApiKey, KeyHash};
pub use cache::{ArtifactStore, CacheArtifact, CacheLookup, CachedConfig, ReplaceOutcome};
pub use config_entry::{
    ConfigEntry, ConfigEntryId, ConfigEntryUpdate, ConfigKey, NewConfigEntry, ValidationLimits,
};
pub use error::DomainError;
pub use game::{ConfigStore, Game, GameId, GameUpdate, KeyRotation, NewGame};
pub use rate_limit::{RateLimitPolicy, RateLimitResult, RateLimitStore, RateLimitWindow};
pub use session::{AdminSession, IssuedSession, SessionStore, SessionTokenHash};
