// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Black Forest: the simulation core of a two-team capture and rescue battle.
//!
//! Two teams share a forested grid split by a river. Each team must carry
//! its captive princess out of the enemy base and back home while keeping
//! its own base gates standing. This crate provides:
//! - A concurrent world model with a strict one-occupant-per-cell invariant
//! - Combat, healing, gate repair and a per-team wood economy
//! - Seeded map generation
//! - A per-role objective engine that tells agents what to do next
//! - A match driver with scripted bots acting in parallel or in turn
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  Match driver with scripted bots    │
//! ├─────────────────────────────────────┤
//! │  Objective engine │ Action handler  │
//! ├─────────────────────────────────────┤
//! │   World (grid + registries + wood)  │
//! └─────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod game;
pub mod geometry;
pub mod objective;
pub mod simulation;

pub use config::{GameConfig, Roster};
pub use error::{ConfigError, MapGenError, SimulationError, WorldError, WorldResult};

// Re-export key world types at crate root for convenience
pub use game::{
    Action, ActionHandler, ActionRequest, Agent, MapStructure, Resource, Role, SpawnRequest,
    Team, World, WorldEvent, WorldView, Zone,
};
pub use geometry::{Direction, Orientation, Vector2D};
pub use objective::{AgentState, Objective};
pub use simulation::{run_match, MatchResult};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<World>();
        assert_send_sync::<ActionHandler>();
    }

    #[test]
    fn test_root_reexports_build_a_match() {
        let config = GameConfig {
            max_ticks: 5,
            parallel: false,
            ..GameConfig::default()
        };
        let result = run_match(&config).unwrap();
        assert_eq!(result.seed, config.seed);
        assert!(result.ticks <= 5);
    }
}
