//! Config store implementations

mod in_memory;
mod postgres;
mod timeout;

use std::sync::Arc;
use std::time::Duration;

pub use in_memory::InMemoryConfigStore;
pub use postgres::{PostgresConfig, PostgresConfigStore};
pub use timeout::TimeoutConfigStore;

use crate::config::{StorageBackend, StorageSettings};
use crate::domain::game::ConfigStore;
use crate::domain::DomainError;

/// Build the configured store, wrapped in the query timeout decorator
pub async fn create_config_store(
    settings: &StorageSettings,
) -> Result<Arc<dyn ConfigStore>, DomainError> {
    let timeout = Duration::from_millis(settings.query_timeout_ms);

    match settings.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory config store");
            Ok(Arc::new(TimeoutConfigStore::new(
                InMemoryConfigStore::new(),
                timeout,
            )))
        }
        StorageBackend::Postgres => {
            let url = settings.database_url.as_deref().ok_or_else(|| {
                DomainError::storage("storage.database_url is required for the postgres backend")
            })?;

            tracing::info!("Connecting to PostgreSQL...");
            let config = PostgresConfig::new(url).with_max_connections(settings.max_connections);
            let store = PostgresConfigStore::connect(&config).await?;
            store.ensure_schema().await?;
            tracing::info!("PostgreSQL connection established");

            Ok(Arc::new(TimeoutConfigStore::new(store, timeout)))
        }
    }
}
