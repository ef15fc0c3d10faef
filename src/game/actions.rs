//! Action boundary between agent reasoning and the world core.
//!
//! Agents are referred to by [`SpawnRequest`] so the first action of an
//! unknown agent creates it. Targets are referred to by name; an unknown
//! target name is a rejected action, not an error.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{WorldError, WorldResult};
use crate::game::entity::{SpawnRequest, StructureClass};
use crate::game::state::World;
use crate::geometry::{Direction, Orientation, Vector2D};
use crate::objective::AgentState;

/// Reach of hands-on actions: chopping, repairing, picking up.
pub const TOUCH_RANGE: i32 = 1;

/// One thing an agent asks the world to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Turn and walk relative to the current facing.
    MoveStep {
        /// Cells to walk.
        step: i32,
        /// Relative turn before walking.
        direction: Direction,
    },
    /// Walk to an absolute cell.
    MoveTo {
        /// Destination.
        target: Vector2D,
        /// Facing after the move.
        orientation: Orientation,
    },
    /// Hit an enemy agent.
    Attack {
        /// Victim name.
        target: String,
        /// Critical hit.
        crit: bool,
    },
    /// Heal an ally.
    Heal {
        /// Patient name.
        target: String,
    },
    /// Hit an enemy gate.
    AttackGate {
        /// Gate name.
        gate: String,
    },
    /// Chop a tree.
    AttackTree {
        /// Tree name.
        tree: String,
    },
    /// Rebuild a destroyed own gate.
    RepairGate {
        /// Gate name.
        gate: String,
    },
    /// Take a princess.
    PickUp {
        /// Princess name.
        princess: String,
    },
    /// Put down the carried princess.
    Drop,
    /// Return to base.
    Spawn,
    /// Restore full HP.
    Reset,
    /// Record a reached objective.
    SetState {
        /// New state.
        state: AgentState,
    },
}

impl Action {
    /// Whether a dead agent may still issue this action.
    #[must_use]
    pub const fn allowed_when_dead(&self) -> bool {
        matches!(self, Action::Spawn | Action::Reset)
    }
}

/// An action together with the agent issuing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Issuing agent; created on first use.
    pub agent: SpawnRequest,
    /// Requested action.
    pub action: Action,
}

impl ActionRequest {
    /// Pair an agent with an action.
    #[must_use]
    pub const fn new(agent: SpawnRequest, action: Action) -> Self {
        Self { agent, action }
    }
}

/// Validates action requests and applies them to a shared world.
#[derive(Debug, Clone)]
pub struct ActionHandler {
    world: Arc<World>,
}

impl ActionHandler {
    /// Create a handler for `world`.
    #[must_use]
    pub const fn new(world: Arc<World>) -> Self {
        Self { world }
    }

    /// The shared world.
    #[must_use]
    pub const fn world(&self) -> &Arc<World> {
        &self.world
    }

    /// Apply one request. Returns whether the action took effect.
    ///
    /// Friendly fire, out-of-range targets, unknown target names and any
    /// action but `Spawn`/`Reset` from a dead agent are rejected with
    /// `Ok(false)`.
    ///
    /// # Errors
    ///
    /// [`WorldError::BaseFull`] if a new agent cannot be placed, or a
    /// poisoned lock.
    pub fn handle(&self, request: &ActionRequest) -> WorldResult<bool> {
        let world = &*self.world;
        let name = request.agent.name.as_str();
        world.ensure_agent(&request.agent)?;
        let actor = world
            .get_agent_by_name(name)?
            .ok_or_else(|| WorldError::UnknownAgent(name.to_string()))?;
        if !actor.is_alive() && !request.action.allowed_when_dead() {
            return Ok(false);
        }
        let origin = actor.position();
        trace!(agent = name, action = ?request.action, "handling action");

        match &request.action {
            Action::MoveStep { step, direction } => world.move_agent_step(name, *step, *direction),
            Action::MoveTo {
                target,
                orientation,
            } => world.move_agent(name, *target, *orientation),
            // Team and range checks for the following four run under the
            // mutator's locks, against positions no other action can change.
            Action::Attack { target, crit } => {
                if !world.contains_agent(target)? {
                    return Ok(false);
                }
                world.strike_agent(name, target, *crit, Some(actor.attack_range))
            }
            Action::Heal { target } => {
                if !world.contains_agent(target)? {
                    return Ok(false);
                }
                world.mend_agent(name, target, Some(actor.attack_range))
            }
            Action::AttackGate { gate } => {
                if world.get_structure_by_name(gate)?.is_none() {
                    return Ok(false);
                }
                world.attack_structure(
                    name,
                    gate,
                    StructureClass::Gate,
                    Some(actor.attack_range),
                )
            }
            Action::AttackTree { tree } => {
                if world.get_structure_by_name(tree)?.is_none() {
                    return Ok(false);
                }
                world.attack_structure(name, tree, StructureClass::Tree, Some(TOUCH_RANGE))
            }
            Action::RepairGate { gate } => {
                let Some(structure) = world.get_structure_by_name(gate)? else {
                    return Ok(false);
                };
                if !structure.position().is_within(origin, TOUCH_RANGE) {
                    return Ok(false);
                }
                world.repair_gate(name, gate)
            }
            Action::PickUp { princess } => {
                if world.get_resource_by_name(princess)?.is_none() {
                    return Ok(false);
                }
                world.lift_princess(name, princess, Some(TOUCH_RANGE))
            }
            Action::Drop => world.drop_princess(name),
            Action::Spawn => world.spawn_agent(name),
            Action::Reset => world.reset_agent(name).map(|()| true),
            Action::SetState { state } => world.set_agent_state(name, *state).map(|()| true),
        }
    }
}
