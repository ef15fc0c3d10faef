//! Error types for the world model, map generation and configuration.
//!
//! Game-rule violations are not errors: resolvers return `Ok(false)`.
//! These types cover programmer errors (unknown names), broken occupancy
//! invariants and environmental failures.

use thiserror::Error;

use crate::game::Team;
use crate::geometry::Vector2D;

/// Errors raised by world queries and mutators.
#[derive(Error, Debug)]
pub enum WorldError {
    /// No agent is registered under this name.
    #[error("unknown agent `{0}`")]
    UnknownAgent(String),

    /// No structure is registered under this name.
    #[error("unknown structure `{0}`")]
    UnknownStructure(String),

    /// No resource is registered under this name.
    #[error("unknown resource `{0}`")]
    UnknownResource(String),

    /// An entity with this name already exists in its registry.
    #[error("duplicate entity name `{0}`")]
    DuplicateName(String),

    /// Attempted to place a second occupant on a cell.
    #[error("cell {position} is already occupied by `{occupant}`")]
    CellOccupied {
        /// The contested cell.
        position: Vector2D,
        /// Name of the occupant already there.
        occupant: String,
    },

    /// No free cell is left in a team's base.
    #[error("no free cell in the {0} base")]
    BaseFull(Team),

    /// Position outside the grid.
    #[error("position {0} lies outside the grid")]
    OutOfBounds(Vector2D),

    /// A lock was poisoned by a panicking holder.
    #[error("{0} lock poisoned")]
    LockPoisoned(&'static str),

    /// Map generation failed while building the world.
    #[error(transparent)]
    MapGen(#[from] MapGenError),
}

/// Result type for world operations.
pub type WorldResult<T> = Result<T, WorldError>;

/// Errors raised while generating the map.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapGenError {
    /// Dimensions too small for the base/river/bridge layout.
    #[error("map {width}x{height} is too small (minimum {min_width}x{min_height})")]
    InvalidDimensions {
        /// Requested width.
        width: i32,
        /// Requested height.
        height: i32,
        /// Smallest accepted width.
        min_width: i32,
        /// Smallest accepted height.
        min_height: i32,
    },

    /// A structure or resource could not be placed.
    #[error("placement failed: {0}")]
    Placement(String),
}

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for [`crate::config::GameConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration parsed but is not playable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors raised by the match driver.
#[derive(Error, Debug)]
pub enum SimulationError {
    /// Configuration rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// World operation failed.
    #[error(transparent)]
    World(#[from] WorldError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WorldError::CellOccupied {
            position: Vector2D::new(3, 4),
            occupant: "warrior_b1".to_string(),
        };
        assert_eq!(err.to_string(), "cell (3, 4) is already occupied by `warrior_b1`");

        let err = WorldError::UnknownAgent("ghost".to_string());
        assert_eq!(err.to_string(), "unknown agent `ghost`");
    }

    #[test]
    fn test_mapgen_error_converts() {
        let err: WorldError = MapGenError::Placement("no room".to_string()).into();
        assert!(matches!(err, WorldError::MapGen(_)));
        assert_eq!(err.to_string(), "placement failed: no room");
    }
}
