//! PostgreSQL config store implementation with connection pooling

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row, Transaction};
use uuid::Uuid;

use crate::domain::api_key::KeyHash;
use crate::domain::config_entry::{
    ConfigEntry, ConfigEntryId, ConfigEntryUpdate, ConfigKey, NewConfigEntry,
};
use crate::domain::game::{ConfigStore, Game, GameId, GameUpdate, KeyRotation, NewGame};
use crate::domain::DomainError;

const GAME_COLUMNS: &str = "id, name, key_hash, active, revision, created_at, updated_at";
const ENTRY_COLUMNS: &str =
    "id, game_id, key, value, description, active, created_at, updated_at";

/// PostgreSQL connection configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Connection acquire timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/game_config".to_string(),
            max_connections: 10,
            connect_timeout_secs: 30,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }
}

/// PostgreSQL implementation of [`ConfigStore`]
///
/// Every write that changes a game's artifact bumps `games.revision` inside
/// the same transaction.
#[derive(Debug, Clone)]
pub struct PostgresConfigStore {
    pool: PgPool,
}

impl PostgresConfigStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &PostgresConfig) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create tables and indexes when missing
    pub async fn ensure_schema(&self) -> Result<(), DomainError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS games (
                id UUID PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                key_hash CHAR(64) NOT NULL UNIQUE,
                active BOOLEAN NOT NULL DEFAULT TRUE,
                revision BIGINT NOT NULL DEFAULT 1,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS config_entries (
                id UUID PRIMARY KEY,
                game_id UUID NOT NULL REFERENCES games(id) ON DELETE CASCADE,
                key VARCHAR(255) NOT NULL,
                value TEXT NOT NULL,
                description TEXT,
                active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                CONSTRAINT config_entries_game_key UNIQUE (game_id, key)
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_config_entries_game ON config_entries(game_id, active)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| DomainError::storage(format!("Failed to create schema: {}", e)))?;
        }

        Ok(())
    }

    async fn begin(&self) -> Result<Transaction<'static, Postgres>, DomainError> {
        self.pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))
    }

    /// Bump a game's revision inside a transaction, failing when it is gone
    async fn bump_revision(
        tx: &mut Transaction<'static, Postgres>,
        game_id: &GameId,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE games SET revision = revision + 1, updated_at = NOW() WHERE id = $1",
        )
        .bind(game_id.as_uuid())
        .execute(&mut **tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to bump revision: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::game_not_found(format!(
                "Game '{}' not found",
                game_id
            )));
        }

        Ok(())
    }
}

async fn commit(tx: Transaction<'static, Postgres>) -> Result<(), DomainError> {
    tx.commit()
        .await
        .map_err(|e| DomainError::storage(format!("Failed to commit transaction: {}", e)))
}

#[async_trait]
impl ConfigStore for PostgresConfigStore {
    async fn find_active_game_by_key_hash(
        &self,
        hash: &KeyHash,
    ) -> Result<Option<Game>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {GAME_COLUMNS} FROM games WHERE key_hash = $1 AND active = TRUE"
        ))
        .bind(hash.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to find game by key: {}", e)))?;

        row.as_ref().map(row_to_game).transpose()
    }

    async fn get_game(&self, id: &GameId) -> Result<Option<Game>, DomainError> {
        let row = sqlx::query(&format!("SELECT {GAME_COLUMNS} FROM games WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get game: {}", e)))?;

        row.as_ref().map(row_to_game).transpose()
    }

    async fn list_games(&self) -> Result<Vec<Game>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {GAME_COLUMNS} FROM games ORDER BY created_at DESC, id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list games: {}", e)))?;

        rows.iter().map(row_to_game).collect()
    }

    async fn create_game(&self, game: NewGame) -> Result<Game, DomainError> {
        let created = Game::new(GameId::new(), game.name, game.key_hash).with_active(game.active);

        sqlx::query(
            r#"
            INSERT INTO games (id, name, key_hash, active, revision, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(created.id().as_uuid())
        .bind(created.name())
        .bind(created.key_hash().as_str())
        .bind(created.is_active())
        .bind(created.revision() as i64)
        .bind(created.created_at())
        .bind(created.updated_at())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::internal("API key hash already in use")
            } else {
                DomainError::storage(format!("Failed to create game: {}", e))
            }
        })?;

        Ok(created)
    }

    async fn update_game(&self, id: &GameId, update: GameUpdate) -> Result<Game, DomainError> {
        if update.is_empty() {
            return self
                .get_game(id)
                .await?
                .ok_or_else(|| DomainError::game_not_found(format!("Game '{}' not found", id)));
        }

        let row = sqlx::query(&format!(
            r#"
            UPDATE games
            SET name = COALESCE($2, name),
                active = COALESCE($3, active),
                revision = revision + 1,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {GAME_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(update.name)
        .bind(update.active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to update game: {}", e)))?;

        match row {
            Some(row) => row_to_game(&row),
            None => Err(DomainError::game_not_found(format!("Game '{}' not found", id))),
        }
    }

    async fn replace_key_hash(
        &self,
        id: &GameId,
        new_hash: KeyHash,
    ) -> Result<KeyRotation, DomainError> {
        let mut tx = self.begin().await?;

        let previous: Option<String> =
            sqlx::query_scalar("SELECT key_hash FROM games WHERE id = $1 FOR UPDATE")
                .bind(id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| DomainError::storage(format!("Failed to lock game: {}", e)))?;

        let previous_hash = match previous {
            Some(hash) => KeyHash::new(hash.trim())
                .map_err(|e| DomainError::storage(format!("Invalid key hash in database: {}", e)))?,
            None => return Err(DomainError::game_not_found(format!("Game '{}' not found", id))),
        };

        let row = sqlx::query(&format!(
            r#"
            UPDATE games
            SET key_hash = $2, revision = revision + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING {GAME_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(new_hash.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::internal("API key hash already in use")
            } else {
                DomainError::storage(format!("Failed to replace key hash: {}", e))
            }
        })?;

        let game = row_to_game(&row)?;
        commit(tx).await?;

        Ok(KeyRotation {
            game,
            previous_hash,
        })
    }

    async fn delete_game(&self, id: &GameId) -> Result<Option<Game>, DomainError> {
        let row = sqlx::query(&format!(
            "DELETE FROM games WHERE id = $1 RETURNING {GAME_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to delete game: {}", e)))?;

        row.as_ref().map(row_to_game).transpose()
    }

    async fn list_active_config_entries(
        &self,
        game_id: &GameId,
    ) -> Result<Vec<ConfigEntry>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {ENTRY_COLUMNS} FROM config_entries WHERE game_id = $1 AND active = TRUE ORDER BY key"
        ))
        .bind(game_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list config entries: {}", e)))?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn list_config_entries(&self, game_id: &GameId) -> Result<Vec<ConfigEntry>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {ENTRY_COLUMNS} FROM config_entries WHERE game_id = $1 ORDER BY key"
        ))
        .bind(game_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list config entries: {}", e)))?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn count_config_entries(&self, game_id: &GameId) -> Result<usize, DomainError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM config_entries WHERE game_id = $1")
            .bind(game_id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count config entries: {}", e)))?;

        Ok(count as usize)
    }

    async fn get_config_entry(
        &self,
        id: &ConfigEntryId,
    ) -> Result<Option<ConfigEntry>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {ENTRY_COLUMNS} FROM config_entries WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get config entry: {}", e)))?;

        row.as_ref().map(row_to_entry).transpose()
    }

    async fn find_config_entry(
        &self,
        game_id: &GameId,
        key: &ConfigKey,
    ) -> Result<Option<ConfigEntry>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {ENTRY_COLUMNS} FROM config_entries WHERE game_id = $1 AND key = $2"
        ))
        .bind(game_id.as_uuid())
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to find config entry: {}", e)))?;

        row.as_ref().map(row_to_entry).transpose()
    }

    async fn insert_config_entry(&self, entry: NewConfigEntry) -> Result<ConfigEntry, DomainError> {
        let created = entry.into_entry();
        let mut tx = self.begin().await?;

        Self::bump_revision(&mut tx, created.game_id()).await?;

        sqlx::query(
            r#"
            INSERT INTO config_entries
                (id, game_id, key, value, description, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(created.id().as_uuid())
        .bind(created.game_id().as_uuid())
        .bind(created.key().as_str())
        .bind(created.value())
        .bind(created.description())
        .bind(created.is_active())
        .bind(created.created_at())
        .bind(created.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::duplicate_config_key(created.key().as_str())
            } else {
                DomainError::storage(format!("Failed to insert config entry: {}", e))
            }
        })?;

        commit(tx).await?;
        Ok(created)
    }

    async fn update_config_entry(
        &self,
        id: &ConfigEntryId,
        update: ConfigEntryUpdate,
    ) -> Result<ConfigEntry, DomainError> {
        let mut tx = self.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {ENTRY_COLUMNS} FROM config_entries WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to lock config entry: {}", e)))?;

        let mut entry = match row {
            Some(row) => row_to_entry(&row)?,
            None => {
                return Err(DomainError::config_not_found(format!(
                    "Config entry '{}' not found",
                    id
                )));
            }
        };

        entry.apply(update);

        sqlx::query(
            r#"
            UPDATE config_entries
            SET key = $2, value = $3, description = $4, active = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(entry.id().as_uuid())
        .bind(entry.key().as_str())
        .bind(entry.value())
        .bind(entry.description())
        .bind(entry.is_active())
        .bind(entry.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DomainError::duplicate_config_key(entry.key().as_str())
            } else {
                DomainError::storage(format!("Failed to update config entry: {}", e))
            }
        })?;

        Self::bump_revision(&mut tx, entry.game_id()).await?;
        commit(tx).await?;

        Ok(entry)
    }

    async fn delete_config_entry(
        &self,
        id: &ConfigEntryId,
    ) -> Result<Option<ConfigEntry>, DomainError> {
        let mut tx = self.begin().await?;

        let row = sqlx::query(&format!(
            "DELETE FROM config_entries WHERE id = $1 RETURNING {ENTRY_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to delete config entry: {}", e)))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let entry = row_to_entry(&row)?;
        Self::bump_revision(&mut tx, entry.game_id()).await?;
        commit(tx).await?;

        Ok(Some(entry))
    }

    async fn ping(&self) -> Result<(), DomainError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| DomainError::storage(format!("Database ping failed: {}", e)))
    }
}

/// Whether a query failed on a unique constraint (SQLSTATE 23505)
fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == "23505")
}

fn row_to_game(row: &PgRow) -> Result<Game, DomainError> {
    let id: Uuid = row.get("id");
    let name: String = row.get("name");
    let key_hash: String = row.get("key_hash");
    let active: bool = row.get("active");
    let revision: i64 = row.get("revision");
    let created_at: DateTime<Utc> = row.get("created_at");
    let updated_at: DateTime<Utc> = row.get("updated_at");

    let key_hash = KeyHash::new(key_hash.trim())
        .map_err(|e| DomainError::storage(format!("Invalid key hash in database: {}", e)))?;

    Ok(Game::restore(
        GameId::from_uuid(id),
        name,
        key_hash,
        active,
        revision.max(0) as u64,
        created_at,
        updated_at,
    ))
}

fn row_to_entry(row: &PgRow) -> Result<ConfigEntry, DomainError> {
    let id: Uuid = row.get("id");
    let game_id: Uuid = row.get("game_id");
    let key: String = row.get("key");
    let value: String = row.get("value");
    let description: Option<String> = row.get("description");
    let active: bool = row.get("active");
    let created_at: DateTime<Utc> = row.get("created_at");
    let updated_at: DateTime<Utc> = row.get("updated_at");

    let key = ConfigKey::new(key)
        .map_err(|e| DomainError::storage(format!("Invalid config key in database: {}", e)))?;

    Ok(ConfigEntry::restore(
        ConfigEntryId::from_uuid(id),
        GameId::from_uuid(game_id),
        key,
        value,
        description,
        active,
        created_at,
        updated_at,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgres_config_default() {
        let config = PostgresConfig::default();

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.connect_timeout_secs, 30);
    }

    #[test]
    fn test_postgres_config_builder() {
        let config = PostgresConfig::new("postgres://localhost/test")
            .with_max_connections(20)
            .with_connect_timeout(60);

        assert_eq!(config.url, "postgres://localhost/test");
        assert_eq!(config.max_connections, 20);
        assert_eq!(config.connect_timeout_secs, 60);
    }

    #[test]
    fn test_non_database_error_is_not_unique_violation() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }
}
