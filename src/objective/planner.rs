//! Shared context for one objective query plus the waypoint lookups the
//! transition tables are built from.

use crate::game::{
    Agent, CellFilter, GameRng, MarkerTag, Resource, StructureClass, Team, World, WorldView, Zone,
};
use crate::geometry::Vector2D;
use crate::objective::state::{AgentState, Objective};

/// One agent's objective query against a consistent world snapshot.
pub(super) struct Planner<'p, 'w> {
    pub(super) world: &'p World,
    pub(super) view: &'p WorldView<'w>,
    pub(super) agent: &'p Agent,
    pub(super) rng: &'p mut GameRng,
}

impl<'p, 'w> Planner<'p, 'w> {
    pub(super) fn new(
        world: &'p World,
        view: &'p WorldView<'w>,
        agent: &'p Agent,
        rng: &'p mut GameRng,
    ) -> Self {
        Self {
            world,
            view,
            agent,
            rng,
        }
    }

    /// Global precedence, then the role table.
    pub(super) fn plan(mut self, role_step: fn(&mut Self) -> Objective) -> Objective {
        if let Some(winner) = self.world.winner() {
            return Objective::stay(self.result_for(winner));
        }
        if self.agent.state.is_terminal() {
            return Objective::stay(self.agent.state);
        }
        if let Some(objective) = self.princess_scenario() {
            return objective;
        }
        role_step(&mut self)
    }

    pub(super) fn result_for(&self, winner: Team) -> AgentState {
        if winner == self.team() {
            AgentState::MyTeamWon
        } else {
            AgentState::MyTeamLost
        }
    }

    pub(super) const fn team(&self) -> Team {
        self.agent.team
    }

    pub(super) const fn position(&self) -> Vector2D {
        self.agent.position()
    }

    pub(super) fn zone_of(&self, position: Vector2D) -> Option<Zone> {
        self.view.zone_at(position)
    }

    pub(super) fn in_ally_base(&self) -> bool {
        self.zone_of(self.position()) == Some(Zone::base_of(self.team()))
    }

    pub(super) fn in_enemy_base(&self) -> bool {
        self.zone_of(self.position()) == Some(Zone::base_of(self.team().opponent()))
    }

    pub(super) fn is_out_of_map(&self) -> bool {
        self.zone_of(self.position())
            .is_none_or(|zone| zone == Zone::OutOfMap)
    }

    /// On the enemy's side of the river.
    pub(super) fn in_enemy_half(&self) -> bool {
        self.view.layout().side_of(self.position().x) == Some(self.team().opponent())
    }

    pub(super) fn on_bridge(&self) -> bool {
        self.view.is_on_bridge(self.position())
    }

    pub(super) fn ally_princess(&self) -> Option<&'p Resource> {
        self.view.princess_of(self.team())
    }

    pub(super) fn enemy_princess(&self) -> Option<&'p Resource> {
        self.view.princess_of(self.team().opponent())
    }

    /// Team of whoever carries `princess`.
    pub(super) fn carrier_team(&self, princess: &Resource) -> Option<Team> {
        princess
            .carried_by
            .as_deref()
            .and_then(|carrier| self.view.agent(carrier).ok())
            .map(|carrier| carrier.team)
    }

    fn nearest(&self, filter: &CellFilter<'_>) -> Option<Vector2D> {
        self.view
            .find_closest(self.position(), filter)
            .map(|cell| cell.position)
    }

    pub(super) fn nearest_marker(&self, tag: MarkerTag) -> Option<Vector2D> {
        self.nearest(
            &CellFilter::any().with_structure(Some(StructureClass::Empty), move |s| {
                s.marker_tag() == Some(tag)
            }),
        )
    }

    pub(super) fn nearest_gate(&self, team: Team) -> Option<Vector2D> {
        self.nearest(
            &CellFilter::any()
                .with_structure(Some(StructureClass::Gate), move |s| s.team == Some(team)),
        )
    }

    pub(super) fn nearest_destroyed_gate(&self) -> Option<Vector2D> {
        let team = self.team();
        self.nearest(&CellFilter::any().with_structure(Some(StructureClass::Gate), move |s| {
            s.team == Some(team) && s.is_destroyed()
        }))
    }

    pub(super) fn nearest_bridge(&self) -> Option<Vector2D> {
        self.nearest(&CellFilter::any().with_structure_class(Some(StructureClass::Bridge)))
    }

    pub(super) fn nearest_live_tree(&self) -> Option<Vector2D> {
        self.nearest(&CellFilter::any().with_structure(Some(StructureClass::Tree), |s| s.hp > 0))
    }

    /// `state` with `target`, or the current state in place when no waypoint exists.
    pub(super) const fn toward_or_stay(
        &self,
        state: AgentState,
        target: Option<Vector2D>,
    ) -> Objective {
        match target {
            Some(target) => Objective::toward(state, target),
            None => Objective::stay(self.agent.state),
        }
    }
}
