//! Match driver: scripted bots playing full matches on a shared world.
//!
//! Provides a pure function interface: `GameConfig -> MatchResult`.
//!
//! Per tick:
//! - every bot reads its objective and submits one action
//!   (concurrently with rayon when `parallel` is set, else in name order)
//! - `World::step` runs the lifecycle rules
//! - events are tallied
//!
//! The match ends when a team wins or `max_ticks` is reached.

mod bot;

pub use bot::{Bot, CRIT_CHANCE};

use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::GameConfig;
use crate::error::{SimulationError, WorldResult};
use crate::game::{Action, ActionHandler, ActionRequest, Role, SpawnRequest, Team, World, WorldEvent};

/// Per-team counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TeamCounts {
    /// Red team's count.
    pub red: u32,
    /// Blue team's count.
    pub blue: u32,
}

impl TeamCounts {
    /// Count of `team`.
    #[must_use]
    pub const fn get(&self, team: Team) -> u32 {
        match team {
            Team::Red => self.red,
            Team::Blue => self.blue,
        }
    }

    fn increment(&mut self, team: Team) {
        let slot = match team {
            Team::Red => &mut self.red,
            Team::Blue => &mut self.blue,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Final result of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    /// Seed the match was played with.
    pub seed: u64,
    /// Winning team (`None` on a draw).
    pub winner: Option<Team>,
    /// Ticks played.
    pub ticks: u64,
    /// Wood held by each team at the end.
    pub wood: TeamCounts,
    /// Agents killed per team (victim's side).
    pub deaths: TeamCounts,
    /// World events observed.
    pub events: u64,
}

/// Spawn requests for both teams' rosters, sorted by name.
///
/// Names follow `<role>_<team letter><index>`, e.g. `warrior_r1`.
#[must_use]
pub fn roster_requests(config: &GameConfig) -> Vec<SpawnRequest> {
    let mut requests: Vec<SpawnRequest> = Team::ALL
        .into_iter()
        .flat_map(|team| {
            Role::ALL.into_iter().flat_map(move |role| {
                (1..=config.roster.count(role)).map(move |i| {
                    SpawnRequest::new(format!("{}_{}{i}", role.label(), team.suffix()), role, team)
                })
            })
        })
        .collect();
    requests.sort_by(|a, b| a.name.cmp(&b.name));
    requests
}

/// Running totals over the event log.
#[derive(Debug, Default)]
struct Tally {
    deaths: TeamCounts,
    events: u64,
}

impl Tally {
    fn absorb(&mut self, events: Vec<WorldEvent>) {
        for event in events {
            self.events += 1;
            if let WorldEvent::AgentKilled { team, .. } = event {
                self.deaths.increment(team);
            }
        }
    }
}

/// Play one match to completion.
///
/// Given the same configuration with `parallel = false`, this always
/// produces the same result.
///
/// # Errors
///
/// [`SimulationError::Config`] for an unplayable configuration,
/// [`SimulationError::World`] for world failures.
pub fn run_match(config: &GameConfig) -> Result<MatchResult, SimulationError> {
    config.validate()?;
    let world = Arc::new(World::generate(config)?);
    let handler = ActionHandler::new(Arc::clone(&world));

    let mut bots: Vec<Bot> = roster_requests(config)
        .into_iter()
        .zip(0u64..)
        .map(|(request, stream)| Bot::new(request, config.seed, stream))
        .collect();
    for bot in &bots {
        handler.handle(&ActionRequest::new(bot.request().clone(), Action::Spawn))?;
    }

    let mut tally = Tally::default();
    tally.absorb(world.drain_events());
    while world.winner().is_none() && world.tick() < config.max_ticks {
        play_tick(&handler, &mut bots, config.parallel)?;
        let report = world.step()?;
        tally.absorb(world.drain_events());
        debug!(tick = report.tick, events = tally.events, "tick played");
    }

    let result = MatchResult {
        seed: config.seed,
        winner: world.winner(),
        ticks: world.tick(),
        wood: TeamCounts {
            red: world.wood_amount(Team::Red),
            blue: world.wood_amount(Team::Blue),
        },
        deaths: tally.deaths,
        events: tally.events,
    };
    info!(
        seed = result.seed,
        winner = ?result.winner,
        ticks = result.ticks,
        "match finished"
    );
    Ok(result)
}

/// Let every bot act once.
fn play_tick(handler: &ActionHandler, bots: &mut [Bot], parallel: bool) -> WorldResult<()> {
    if parallel {
        bots.par_iter_mut()
            .try_for_each(|bot| bot.act(handler).map(|_| ()))
    } else {
        bots.iter_mut()
            .try_for_each(|bot| bot.act(handler).map(|_| ()))
    }
}
