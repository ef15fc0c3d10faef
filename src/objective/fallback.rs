//! Recovery plans for agents whose main-line state no longer applies.
//!
//! Each plan classifies the agent by zone, map half and bridge, then aims
//! for the nearest typed waypoint of that class.

use crate::game::MarkerTag;
use crate::objective::planner::Planner;
use crate::objective::state::{AgentState, Objective};

impl Planner<'_, '_> {
    /// Carrier of the own princess. Reaching the own base wins the match.
    pub(super) fn fallback_rescue(&mut self) -> Objective {
        if self.in_ally_base() {
            let winner = self.world.declare_winner(self.team());
            return Objective::stay(self.result_for(winner));
        }
        self.route_home(AgentState::RescueAllyPrincess)
    }

    /// Carrier of the enemy princess: bring her back to her holding cell.
    pub(super) fn fallback_capture(&mut self) -> Objective {
        if self.in_ally_base() {
            let hold = self.nearest_marker(MarkerTag::princess_hold(self.team().opponent()));
            return self.toward_or_stay(AgentState::CaptureEnemyPrincess, hold);
        }
        self.route_home(AgentState::CaptureEnemyPrincess)
    }

    /// Next waypoint on the way back to the own base.
    pub(super) fn route_home(&self, state: AgentState) -> Objective {
        let team = self.team();
        let target = if self.in_enemy_base() {
            self.nearest_marker(MarkerTag::base(team.opponent()))
        } else if self.is_out_of_map() {
            None
        } else if self.on_bridge() {
            self.nearest_gate(team)
        } else if self.in_enemy_half() {
            self.nearest_marker(MarkerTag::Half)
        } else {
            self.nearest_gate(team)
        };
        self.toward_or_stay(state, target)
    }

    /// Re-enter the soldier route from wherever the agent stands.
    pub(super) fn fallback_general(&self) -> Objective {
        let team = self.team();
        let enemy = team.opponent();
        if self.in_ally_base() {
            return self.toward_or_stay(AgentState::ExitFromAllyBase, self.nearest_gate(team));
        }
        if self.in_enemy_base() {
            return match self.ally_princess().filter(|p| !p.is_carried()) {
                Some(princess) => {
                    Objective::toward(AgentState::RescueAllyPrincess, princess.position())
                }
                None => {
                    self.toward_or_stay(AgentState::EnemyGateReached, self.nearest_gate(enemy))
                }
            };
        }
        if self.is_out_of_map() {
            return Objective::stay(self.agent.state);
        }
        if self.on_bridge() {
            return self.toward_or_stay(
                AgentState::BridgeReached,
                self.nearest_marker(MarkerTag::base(enemy)),
            );
        }
        if self.in_enemy_half() {
            return self.toward_or_stay(
                AgentState::LandPassageReached,
                self.nearest_marker(MarkerTag::base(enemy)),
            );
        }
        self.toward_or_stay(
            AgentState::TowardsLandPassage,
            self.nearest_marker(MarkerTag::Half),
        )
    }
}
