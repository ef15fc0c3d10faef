//! World model for Black Forest.
//!
//! Implements the battle rules on a shared, lock-protected world:
//! - Spatial grid with zones and the cell occupancy invariant
//! - Name-keyed registries for agents, structures and resources
//! - Combat (attack, heal, structure damage) and the wood economy
//! - Movement, spawning and princess carrying
//! - Action boundary for agent reasoning layers

mod actions;
mod combat;
mod economy;
mod entity;
mod events;
mod invariants;
mod map;
mod mapgen;
mod movement;
mod registry;
mod state;

pub use actions::{Action, ActionHandler, ActionRequest, TOUCH_RANGE};
pub use combat::{apply_damage, apply_heal, CRIT_MULTIPLIER};
pub use economy::{WoodStock, ENOUGH_WOOD_AMOUNT, WOOD_STOCKPILE};
pub use entity::{
    Agent, MapStructure, MarkerTag, Named, Resource, ResourceKind, Role, RoleStats, SpawnRequest,
    StructureClass, StructureKind, Team, BRIDGE_SLIP_PROBABILITY, GATE_MAX_HP, TREE_MAX_HP,
};
pub use events::WorldEvent;
pub use invariants::{assert_invariants, check_invariants, InvariantViolation};
pub use map::{Cell, CellFilter, Occupants, SpatialGrid, Zone};
pub use mapgen::{generate_map, GameRng, GeneratedMap, Layout, MIN_HEIGHT, MIN_WIDTH};
pub use registry::{EntityMap, Registry};
pub use state::{StepReport, World, WorldView};

#[cfg(test)]
pub(crate) use state::fixtures;
