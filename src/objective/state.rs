//! Objective states and the engine's output type.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Vector2D;

/// Named objective an agent is pursuing (or has just completed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    /// Freshly (re)spawned in the own base.
    Spawn,
    /// Heading for an own gate to leave the base.
    ExitFromAllyBase,
    /// Stepping onto the staging marker before picking a route.
    ChoosePath,
    /// Heading for the land passage.
    TowardsLandPassage,
    /// Heading for the bridge.
    TowardsBridge,
    /// Across the river via the land passage, heading for the enemy base.
    LandPassageReached,
    /// Across the river via the bridge, heading for the enemy base.
    BridgeReached,
    /// At the enemy gates.
    EnemyGateReached,
    /// Retrieving or escorting the own princess.
    RescueAllyPrincess,
    /// Retrieving or returning the enemy princess.
    CaptureEnemyPrincess,
    /// Gatherer: heading for a tree.
    GatherWood,
    /// Gatherer: chopping a tree.
    TreeReached,
    /// Gatherer: just repaired a gate.
    RepairingGate,
    /// Gatherer: heading to repair a destroyed own gate.
    RepairDestroyedGate,
    /// Terminal: own team won.
    MyTeamWon,
    /// Terminal: own team lost.
    MyTeamLost,
    /// Terminal until reset: agent is dead.
    Dead,
}

impl AgentState {
    /// Every state.
    pub const ALL: [AgentState; 17] = [
        AgentState::Spawn,
        AgentState::ExitFromAllyBase,
        AgentState::ChoosePath,
        AgentState::TowardsLandPassage,
        AgentState::TowardsBridge,
        AgentState::LandPassageReached,
        AgentState::BridgeReached,
        AgentState::EnemyGateReached,
        AgentState::RescueAllyPrincess,
        AgentState::CaptureEnemyPrincess,
        AgentState::GatherWood,
        AgentState::TreeReached,
        AgentState::RepairingGate,
        AgentState::RepairDestroyedGate,
        AgentState::MyTeamWon,
        AgentState::MyTeamLost,
        AgentState::Dead,
    ];

    /// Wire label, as used by the agent runtime.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            AgentState::Spawn => "spawn",
            AgentState::ExitFromAllyBase => "exit_from_ally_base",
            AgentState::ChoosePath => "choose_path",
            AgentState::TowardsLandPassage => "towards_land_passage",
            AgentState::TowardsBridge => "towards_bridge",
            AgentState::LandPassageReached => "land_passage_reached",
            AgentState::BridgeReached => "bridge_reached",
            AgentState::EnemyGateReached => "enemy_gate_reached",
            AgentState::RescueAllyPrincess => "rescue_ally_princess",
            AgentState::CaptureEnemyPrincess => "capture_enemy_princess",
            AgentState::GatherWood => "gather_wood",
            AgentState::TreeReached => "tree_reached",
            AgentState::RepairingGate => "repairing_gate",
            AgentState::RepairDestroyedGate => "repair_destroyed_gate",
            AgentState::MyTeamWon => "my_team_won",
            AgentState::MyTeamLost => "my_team_lost",
            AgentState::Dead => "dead",
        }
    }

    /// Parse a wire label; anything unrecognized is [`AgentState::Dead`].
    #[must_use]
    pub fn parse_lossy(label: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == label)
            .unwrap_or(AgentState::Dead)
    }

    /// Absorbing states: returned unchanged until an external reset.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            AgentState::MyTeamWon | AgentState::MyTeamLost | AgentState::Dead
        )
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine output: next state plus where to go. `target` is `None` when no
/// waypoint applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Objective {
    /// Next state.
    pub state: AgentState,
    /// Target position.
    pub target: Option<Vector2D>,
}

impl Objective {
    /// Objective with a target.
    #[must_use]
    pub const fn toward(state: AgentState, target: Vector2D) -> Self {
        Self {
            state,
            target: Some(target),
        }
    }

    /// Objective without a target.
    #[must_use]
    pub const fn stay(state: AgentState) -> Self {
        Self {
            state,
            target: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip() {
        for state in AgentState::ALL {
            assert_eq!(AgentState::parse_lossy(state.as_str()), state);
        }
    }

    #[test]
    fn test_unknown_label_is_dead() {
        assert_eq!(AgentState::parse_lossy("dancing"), AgentState::Dead);
        assert_eq!(AgentState::parse_lossy(""), AgentState::Dead);
    }

    #[test]
    fn test_terminal_states() {
        let terminal: Vec<_> = AgentState::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(
            terminal,
            vec![AgentState::MyTeamWon, AgentState::MyTeamLost, AgentState::Dead]
        );
    }

    #[test]
    fn test_serde_uses_wire_labels() {
        let json = serde_json::to_string(&AgentState::ExitFromAllyBase).unwrap();
        assert_eq!(json, "\"exit_from_ally_base\"");
    }
}
