//! Match configuration.
//!
//! Loaded from TOML; every key is optional and falls back to the default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::game::{Role, MIN_HEIGHT, MIN_WIDTH};

/// Number of agents of each role fielded by each team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Roster {
    /// Warriors per team.
    pub warriors: u8,
    /// Archers per team.
    pub archers: u8,
    /// Priests per team.
    pub priests: u8,
    /// Gatherers per team.
    pub gatherers: u8,
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            warriors: 2,
            archers: 1,
            priests: 1,
            gatherers: 2,
        }
    }
}

impl Roster {
    /// Count for one role.
    #[must_use]
    pub const fn count(&self, role: Role) -> u8 {
        match role {
            Role::Warrior => self.warriors,
            Role::Archer => self.archers,
            Role::Priest => self.priests,
            Role::Gatherer => self.gatherers,
        }
    }

    /// Agents per team.
    #[must_use]
    pub fn total(&self) -> u32 {
        Role::ALL.iter().map(|&role| u32::from(self.count(role))).sum()
    }
}

/// Complete match configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Map width in cells.
    pub width: i32,
    /// Map height in cells.
    pub height: i32,
    /// Seed for map generation and every random draw.
    pub seed: u64,
    /// Ticks a dead agent waits before it is reset.
    pub respawn_ticks: u64,
    /// Ticks a destroyed tree waits before it grows back.
    pub tree_regrow_ticks: u64,
    /// Tick limit after which a match is a draw.
    pub max_ticks: u64,
    /// Let agents act concurrently within a tick.
    pub parallel: bool,
    /// Agents fielded per team.
    pub roster: Roster,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 40,
            height: 15,
            seed: 42,
            respawn_ticks: 10,
            tree_regrow_ticks: 50,
            max_ticks: 2000,
            parallel: true,
            roster: Roster::default(),
        }
    }
}

impl GameConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed TOML, [`ConfigError::Invalid`]
    /// for unplayable values.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`GameConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Reject configurations that cannot produce a playable match.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < MIN_WIDTH || self.height < MIN_HEIGHT {
            return Err(ConfigError::Invalid(format!(
                "map {}x{} is smaller than {MIN_WIDTH}x{MIN_HEIGHT}",
                self.width, self.height
            )));
        }
        if self.roster.total() == 0 {
            return Err(ConfigError::Invalid("roster is empty".to_string()));
        }
        if self.max_ticks == 0 {
            return Err(ConfigError::Invalid("max_ticks must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!((config.width, config.height), (40, 15));
        assert_eq!(config.roster.total(), 6);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = GameConfig::from_toml_str(
            r"
            seed = 7
            width = 48

            [roster]
            warriors = 4
            ",
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.width, 48);
        assert_eq!(config.height, 15);
        assert_eq!(config.roster.warriors, 4);
        assert_eq!(config.roster.gatherers, 2);
    }

    #[test]
    fn test_small_map_rejected() {
        let err = GameConfig::from_toml_str("width = 10").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_empty_roster_rejected() {
        let err = GameConfig::from_toml_str(
            "[roster]\nwarriors = 0\narchers = 0\npriests = 0\ngatherers = 0\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("roster")));
    }

    #[test]
    fn test_malformed_toml() {
        let err = GameConfig::from_toml_str("width = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("match.toml");
        std::fs::write(&path, "seed = 99\nmax_ticks = 10\n").unwrap();
        let config = GameConfig::load(&path).unwrap();
        assert_eq!(config.seed, 99);
        assert_eq!(config.max_ticks, 10);

        let missing = GameConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io(_)));
    }
}
