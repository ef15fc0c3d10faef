//! Gatherer transition table.

use crate::game::WOOD_STOCKPILE;
use crate::objective::planner::Planner;
use crate::objective::state::{AgentState, Objective};

impl Planner<'_, '_> {
    pub(super) fn gatherer_step(&mut self) -> Objective {
        if let Some(objective) = self.gate_repair_scenario() {
            return objective;
        }
        match self.agent.state {
            AgentState::Spawn | AgentState::RepairingGate | AgentState::RepairDestroyedGate => {
                self.toward_or_stay(AgentState::ExitFromAllyBase, self.nearest_gate(self.team()))
            }
            AgentState::ExitFromAllyBase | AgentState::TreeReached => {
                let stocked = self.world.wood_amount(self.team()) >= WOOD_STOCKPILE;
                match self.nearest_live_tree().filter(|_| !stocked) {
                    Some(tree) => Objective::toward(AgentState::GatherWood, tree),
                    None => Objective::toward(AgentState::ChoosePath, self.position()),
                }
            }
            AgentState::GatherWood => {
                self.toward_or_stay(AgentState::TreeReached, self.nearest_live_tree())
            }
            _ => self.advance(),
        }
    }
}
