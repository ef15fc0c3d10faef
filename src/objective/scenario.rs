//! Scenario handlers that pre-empt the role tables.

use crate::game::{ENOUGH_WOOD_AMOUNT, Layout, Zone};
use crate::geometry::Vector2D;
use crate::objective::planner::Planner;
use crate::objective::state::{AgentState, Objective};

impl Planner<'_, '_> {
    /// Carrying, chasing or escorting a princess.
    pub(super) fn princess_scenario(&mut self) -> Option<Objective> {
        let team = self.team();
        if let Some(carried) = self.agent.carried.as_deref() {
            let princess = self.view.resource(carried).ok()?;
            return Some(if princess.team == Some(team) {
                self.fallback_rescue()
            } else {
                self.fallback_capture()
            });
        }

        let own_base = Zone::base_of(team);
        let loose_enemy = self
            .enemy_princess()
            .filter(|p| !p.is_carried() && self.zone_of(p.position()) != Some(own_base));
        if let Some(princess) = loose_enemy {
            return Some(Objective::toward(
                AgentState::CaptureEnemyPrincess,
                princess.position(),
            ));
        }

        let escorted_by_teammate = self.ally_princess().is_some_and(|p| {
            p.carried_by
                .as_deref()
                .is_some_and(|carrier| carrier != self.agent.name)
                && self.carrier_team(p) == Some(team)
        });
        if escorted_by_teammate && (self.in_enemy_base() || self.in_enemy_half()) {
            return Some(self.route_home(AgentState::RescueAllyPrincess));
        }
        None
    }

    /// Gatherers head behind a destroyed own gate once the team can pay for it.
    pub(super) fn gate_repair_scenario(&self) -> Option<Objective> {
        if self.world.wood_amount(self.team()) < ENOUGH_WOOD_AMOUNT {
            return None;
        }
        let gate = self.nearest_destroyed_gate()?;
        Some(Objective::toward(
            AgentState::RepairDestroyedGate,
            gate + Vector2D::new(Layout::inward(self.team()), 0),
        ))
    }
}
