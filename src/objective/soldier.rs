//! Soldier transition table and the route tail shared with gatherers.

use rand::Rng;

use crate::game::{MarkerTag, Team, Zone};
use crate::objective::planner::Planner;
use crate::objective::state::{AgentState, Objective};

impl Planner<'_, '_> {
    pub(super) fn soldier_step(&mut self) -> Objective {
        match self.agent.state {
            AgentState::Spawn => {
                self.toward_or_stay(AgentState::ExitFromAllyBase, self.nearest_gate(self.team()))
            }
            AgentState::GatherWood
            | AgentState::TreeReached
            | AgentState::RepairingGate
            | AgentState::RepairDestroyedGate => Objective::stay(AgentState::Dead),
            _ => self.advance(),
        }
    }

    /// From the own gate to the enemy princess.
    pub(super) fn advance(&mut self) -> Objective {
        let team = self.team();
        let enemy = team.opponent();
        match self.agent.state {
            AgentState::ExitFromAllyBase => {
                self.toward_or_stay(AgentState::ChoosePath, self.nearest_marker(MarkerTag::base(team)))
            }
            AgentState::ChoosePath => {
                if self.rng.gen_range(0.0..1.0) < self.agent.land_probability {
                    self.toward_or_stay(
                        AgentState::TowardsLandPassage,
                        self.nearest_marker(MarkerTag::Half),
                    )
                } else {
                    self.toward_or_stay(AgentState::TowardsBridge, self.nearest_bridge())
                }
            }
            AgentState::TowardsLandPassage => self.toward_or_stay(
                AgentState::LandPassageReached,
                self.nearest_marker(MarkerTag::base(enemy)),
            ),
            AgentState::TowardsBridge => self.toward_or_stay(
                AgentState::BridgeReached,
                self.nearest_marker(MarkerTag::base(enemy)),
            ),
            AgentState::LandPassageReached | AgentState::BridgeReached => {
                self.toward_or_stay(AgentState::EnemyGateReached, self.nearest_gate(enemy))
            }
            AgentState::EnemyGateReached | AgentState::RescueAllyPrincess => self.rescue_ally(),
            AgentState::CaptureEnemyPrincess => self.capture_enemy(team),
            _ => Objective::stay(AgentState::Dead),
        }
    }

    fn rescue_ally(&self) -> Objective {
        let Some(princess) = self.ally_princess() else {
            return self.fallback_general();
        };
        match self.carrier_team(princess) {
            Some(team) if team == self.team() => self.fallback_general(),
            _ => Objective::toward(AgentState::RescueAllyPrincess, princess.position()),
        }
    }

    fn capture_enemy(&self, team: Team) -> Objective {
        let Some(princess) = self.enemy_princess() else {
            return self.fallback_general();
        };
        let chase = match self.carrier_team(princess) {
            Some(carrier) => carrier != team,
            None => {
                !princess.is_carried()
                    && self.zone_of(princess.position()) != Some(Zone::base_of(team))
            }
        };
        if chase {
            Objective::toward(AgentState::CaptureEnemyPrincess, princess.position())
        } else {
            self.fallback_general()
        }
    }
}
