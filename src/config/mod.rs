//! Layered application configuration

mod app_config;

pub use app_config::{
    AdminSettings, AppConfig, CacheSettings, LogFormat, LoggingConfig, MaintenanceSettings,
    RateLimitBackend, RateLimitSettings, ServerConfig, StorageBackend, StorageSettings,
};
