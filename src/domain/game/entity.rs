//! Game entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::api_key::KeyHash;

/// Game identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(Uuid);

impl GameId {
    /// Generate a fresh identifier
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

impl Default for GameId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::str::FromStr for GameId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tenant of the configuration service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    id: GameId,
    name: String,
    /// Digest of the game's current API key; the raw key is never stored
    key_hash: KeyHash,
    active: bool,
    /// Bumped by the store on every write that changes the game's artifact
    revision: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Game {
    pub fn new(id: GameId, name: impl Into<String>, key_hash: KeyHash) -> Self {
        let now = Utc::now();

        Self {
            id,
            name: name.into(),
            key_hash,
            active: true,
            revision: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rehydrate a game from persisted columns
    pub fn restore(
        id: GameId,
        name: String,
        key_hash: KeyHash,
        active: bool,
        revision: u64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            key_hash,
            active,
            revision,
            created_at,
            updated_at,
        }
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    // Getters

    pub fn id(&self) -> &GameId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key_hash(&self) -> &KeyHash {
        &self.key_hash
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Mutators

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        self.touch();
    }

    pub fn set_key_hash(&mut self, key_hash: KeyHash) {
        self.key_hash = key_hash;
        self.touch();
    }

    /// Record a change to anything the cache artifact derives from
    pub fn bump_revision(&mut self) {
        self.revision += 1;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Input for creating a game
#[derive(Debug, Clone)]
pub struct NewGame {
    pub name: String,
    pub key_hash: KeyHash,
    pub active: bool,
}

/// Partial update of a game
#[derive(Debug, Clone, Default)]
pub struct GameUpdate {
    pub name: Option<String>,
    pub active: Option<bool>,
}

impl GameUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.active.is_none()
    }
}

/// Outcome of replacing a game's key hash
#[derive(Debug, Clone)]
pub struct KeyRotation {
    pub game: Game,
    pub previous_hash: KeyHash,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(c: char) -> KeyHash {
        KeyHash::new(c.to_string().repeat(64)).unwrap()
    }

    #[test]
    fn test_game_creation() {
        let game = Game::new(GameId::new(), "Space Miners", hash('a'));

        assert_eq!(game.name(), "Space Miners");
        assert!(game.is_active());
        assert_eq!(game.revision(), 1);
    }

    #[test]
    fn test_game_id_parse() {
        let id = GameId::new();
        let parsed: GameId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);

        assert!("not-a-uuid".parse::<GameId>().is_err());
    }

    #[test]
    fn test_bump_revision() {
        let mut game = Game::new(GameId::new(), "Game", hash('b'));
        let before = game.updated_at();

        game.bump_revision();
        game.bump_revision();

        assert_eq!(game.revision(), 3);
        assert!(game.updated_at() >= before);
    }

    #[test]
    fn test_game_update_is_empty() {
        assert!(GameUpdate::default().is_empty());
        assert!(!GameUpdate {
            active: Some(false),
            ..Default::default()
        }
        .is_empty());
    }
}
