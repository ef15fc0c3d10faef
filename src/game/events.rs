//! Observer notifications emitted by successful mutations.

use serde::Serialize;

use crate::game::entity::Team;
use crate::geometry::Vector2D;

/// A state change observers may want to redraw or log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorldEvent {
    /// Agent created and placed in its base.
    AgentCreated {
        /// Agent name.
        agent: String,
        /// Spawn cell.
        position: Vector2D,
    },
    /// Agent moved to a new cell.
    AgentMoved {
        /// Agent name.
        agent: String,
        /// Previous cell.
        from: Vector2D,
        /// New cell.
        to: Vector2D,
    },
    /// Agent took damage.
    AgentDamaged {
        /// Attacker name.
        attacker: String,
        /// Target name.
        target: String,
        /// Target HP after the hit.
        hp: u32,
    },
    /// Agent reached zero HP.
    AgentKilled {
        /// Attacker name.
        attacker: String,
        /// Victim name.
        target: String,
        /// Victim's team.
        team: Team,
    },
    /// Agent was healed.
    AgentHealed {
        /// Healer name.
        healer: String,
        /// Target name.
        target: String,
        /// Target HP after the heal.
        hp: u32,
    },
    /// Agent was moved back to its base (dead or respawning).
    AgentRespawned {
        /// Agent name.
        agent: String,
        /// Base cell.
        position: Vector2D,
        /// Whether the agent is waiting out its respawn delay.
        dead: bool,
    },
    /// Agent restored to full HP.
    AgentReset {
        /// Agent name.
        agent: String,
    },
    /// Structure took damage.
    StructureDamaged {
        /// Structure name.
        structure: String,
        /// HP after the hit.
        hp: u32,
    },
    /// Structure reached zero HP.
    StructureDestroyed {
        /// Structure name.
        structure: String,
    },
    /// Gate restored with wood.
    GateRepaired {
        /// Gate name.
        gate: String,
        /// Team that paid.
        team: Team,
    },
    /// Tree grew back.
    TreeRegrown {
        /// Tree name.
        tree: String,
    },
    /// Team wood stock increased.
    WoodGathered {
        /// Team credited.
        team: Team,
        /// New stock.
        total: u32,
    },
    /// Princess picked up.
    PrincessPickedUp {
        /// Princess name.
        princess: String,
        /// Carrier name.
        carrier: String,
    },
    /// Princess put on the ground.
    PrincessDropped {
        /// Princess name.
        princess: String,
        /// Landing cell.
        position: Vector2D,
    },
    /// Match decided.
    WinDeclared {
        /// Winning team.
        team: Team,
    },
}
