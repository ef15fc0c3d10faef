//! Objective engine: per-role state machines that pick each agent's next
//! sub-goal and the waypoint leading to it.
//!
//! Precedence, checked before any role table:
//!
//! ```text
//! winner declared ──► my_team_won / my_team_lost
//! terminal state  ──► unchanged
//! princess scenario (carrying, loose enemy princess, escort)
//! gate-repair scenario (gatherers only)
//! role transition table
//! ```

mod fallback;
mod gatherer;
mod planner;
mod scenario;
mod soldier;
mod state;

pub use state::{AgentState, Objective};

use rand::{RngCore, SeedableRng};

use crate::error::{WorldError, WorldResult};
use crate::game::{Agent, GameRng, World, WorldView};
use planner::Planner;

/// Next objective of a warrior, archer or priest.
#[must_use]
pub fn objective_for_soldier(
    world: &World,
    view: &WorldView<'_>,
    agent: &Agent,
    rng: &mut GameRng,
) -> Objective {
    Planner::new(world, view, agent, rng).plan(Planner::soldier_step)
}

/// Next objective of a gatherer.
#[must_use]
pub fn objective_for_gatherer(
    world: &World,
    view: &WorldView<'_>,
    agent: &Agent,
    rng: &mut GameRng,
) -> Objective {
    Planner::new(world, view, agent, rng).plan(Planner::gatherer_step)
}

impl World {
    /// Objective of `name`, drawing from the world's RNG.
    ///
    /// The world RNG is advanced once per query, before any grid lock is
    /// taken, so concurrent callers never share a draw.
    ///
    /// A match result is written back into the agent's state so it stays
    /// absorbing.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownAgent`] or a poisoned lock.
    pub fn closest_objective(&self, name: &str) -> WorldResult<Objective> {
        let seed = self.rng()?.next_u64();
        let mut rng = GameRng::seed_from_u64(seed);
        self.closest_objective_with(name, &mut rng)
    }

    /// Objective of `name`, drawing from the caller's RNG.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownAgent`] or a poisoned lock.
    pub fn closest_objective_with(&self, name: &str, rng: &mut GameRng) -> WorldResult<Objective> {
        let view = self.view()?;
        let agent = view
            .agent(name)
            .map_err(|_| WorldError::UnknownAgent(name.to_string()))?;
        let objective = if agent.role.is_soldier() {
            objective_for_soldier(self, &view, agent, rng)
        } else {
            objective_for_gatherer(self, &view, agent, rng)
        };
        let previous = agent.state;
        drop(view);

        let settled = matches!(objective.state, AgentState::MyTeamWon | AgentState::MyTeamLost);
        if settled && previous != objective.state {
            self.set_agent_state(name, objective.state)?;
        }
        Ok(objective)
    }
}
