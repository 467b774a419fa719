//! Configuration entry entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::{validate_config_key, ConfigKeyValidationError};
use crate::domain::game::GameId;

/// Configuration entry identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigEntryId(Uuid);

impl ConfigEntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ConfigEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::str::FromStr for ConfigEntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl std::fmt::Display for ConfigEntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Configuration key - `[A-Za-z0-9_.-]`, max 255 characters, unique per game
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConfigKey(String);

impl ConfigKey {
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigKeyValidationError> {
        let key = key.into();
        validate_config_key(&key)?;
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ConfigKey {
    type Error = ConfigKeyValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ConfigKey> for String {
    fn from(key: ConfigKey) -> Self {
        key.0
    }
}

impl std::fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A key/value configuration entry owned by a game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigEntry {
    id: ConfigEntryId,
    game_id: GameId,
    key: ConfigKey,
    /// Raw stored value; decoded as JSON when it parses
    value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ConfigEntry {
    pub fn new(game_id: GameId, key: ConfigKey, value: impl Into<String>) -> Self {
        let now = Utc::now();

        Self {
            id: ConfigEntryId::new(),
            game_id,
            key,
            value: value.into(),
            description: None,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rehydrate an entry from persisted columns
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: ConfigEntryId,
        game_id: GameId,
        key: ConfigKey,
        value: String,
        description: Option<String>,
        active: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            game_id,
            key,
            value,
            description,
            active,
            created_at,
            updated_at,
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    // Getters

    pub fn id(&self) -> &ConfigEntryId {
        &self.id
    }

    pub fn game_id(&self) -> &GameId {
        &self.game_id
    }

    pub fn key(&self) -> &ConfigKey {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Apply a partial update
    pub fn apply(&mut self, update: ConfigEntryUpdate) {
        if let Some(key) = update.key {
            self.key = key;
        }

        if let Some(value) = update.value {
            self.value = value;
        }

        if let Some(description) = update.description {
            self.description = description;
        }

        if let Some(active) = update.active {
            self.active = active;
        }

        self.updated_at = Utc::now();
    }
}

/// Input for creating a configuration entry
#[derive(Debug, Clone)]
pub struct NewConfigEntry {
    pub game_id: GameId,
    pub key: ConfigKey,
    pub value: String,
    pub description: Option<String>,
    pub active: bool,
}

impl NewConfigEntry {
    pub fn into_entry(self) -> ConfigEntry {
        ConfigEntry::new(self.game_id, self.key, self.value)
            .with_description(self.description)
            .with_active(self.active)
    }
}

/// Partial update of a configuration entry
///
/// `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default)]
pub struct ConfigEntryUpdate {
    pub key: Option<ConfigKey>,
    pub value: Option<String>,
    pub description: Option<Option<String>>,
    pub active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_key_valid() {
        let key = ConfigKey::new("player.max_health").unwrap();
        assert_eq!(key.as_str(), "player.max_health");
    }

    #[test]
    fn test_config_key_invalid() {
        assert!(ConfigKey::new("").is_err());
        assert!(ConfigKey::new("has space").is_err());
        assert!(ConfigKey::new("<script>").is_err());
    }

    #[test]
    fn test_entry_apply_update() {
        let key = ConfigKey::new("max_players").unwrap();
        let mut entry = ConfigEntry::new(GameId::new(), key, "10")
            .with_description(Some("Lobby size".to_string()));

        entry.apply(ConfigEntryUpdate {
            value: Some("12".to_string()),
            description: Some(None),
            active: Some(false),
            ..Default::default()
        });

        assert_eq!(entry.value(), "12");
        assert_eq!(entry.key().as_str(), "max_players");
        assert!(entry.description().is_none());
        assert!(!entry.is_active());
    }

    #[test]
    fn test_new_config_entry_into_entry() {
        let game_id = GameId::new();
        let entry = NewConfigEntry {
            game_id,
            key: ConfigKey::new("motd").unwrap(),
            value: "hello".to_string(),
            description: None,
            active: false,
        }
        .into_entry();

        assert_eq!(entry.game_id(), &game_id);
        assert!(!entry.is_active());
    }
}
