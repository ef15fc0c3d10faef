//! World invariants - sanity checks that detect bugs.
//!
//! Mutators keep these true under any interleaving of actions. A violation
//! means a locking or logic bug, never a game-rule failure.

use std::collections::HashMap;

use thiserror::Error;

use crate::game::state::{World, WorldView};
use crate::objective::AgentState;

/// Invariant violation error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invariant violation: {message}")]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl InvariantViolation {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Check all world invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(world: &World) -> Vec<InvariantViolation> {
    let view = match world.view() {
        Ok(view) => view,
        Err(err) => return vec![InvariantViolation::new(err.to_string())],
    };
    let mut violations = Vec::new();
    check_cells(&view, &mut violations);
    check_agents(&view, &mut violations);
    check_resources(&view, &mut violations);
    check_win(world, &view, &mut violations);
    violations
}

/// Occupancy: a cell holds one occupant, or a walkable structure plus one
/// agent or one resource. Cell names must resolve.
fn check_cells(view: &WorldView<'_>, violations: &mut Vec<InvariantViolation>) {
    for cell in view.grid().cells() {
        let position = cell.position;
        if cell.agent.is_some() && cell.resource.is_some() {
            violations.push(InvariantViolation::new(format!(
                "cell {position} holds both an agent and a resource"
            )));
        }
        if let Some(name) = cell.structure.as_deref() {
            match view.structure(name) {
                Ok(structure) => {
                    if cell.resource.is_some() && !structure.is_walkable_for(None) {
                        violations.push(InvariantViolation::new(format!(
                            "resource shares cell {position} with blocking `{name}`"
                        )));
                    }
                    let blocked = cell
                        .agent
                        .as_deref()
                        .and_then(|a| view.agent(a).ok())
                        .filter(|a| !structure.is_walkable_for(Some(a.team)));
                    if let Some(agent) = blocked {
                        violations.push(InvariantViolation::new(format!(
                            "`{}` stands on blocking `{name}` at {position}",
                            agent.name
                        )));
                    }
                }
                Err(_) => violations.push(InvariantViolation::new(format!(
                    "cell {position} names unknown structure `{name}`"
                ))),
            }
        }
        if let Some(name) = cell.agent.as_deref() {
            match view.agent(name) {
                Ok(agent) if agent.position() != position => {
                    violations.push(InvariantViolation::new(format!(
                        "cell {position} holds `{name}` which is at {}",
                        agent.position()
                    )));
                }
                Ok(_) => {}
                Err(_) => violations.push(InvariantViolation::new(format!(
                    "cell {position} names unknown agent `{name}`"
                ))),
            }
        }
        if let Some(name) = cell.resource.as_deref() {
            match view.resource(name) {
                Ok(resource) if resource.is_carried() => {
                    violations.push(InvariantViolation::new(format!(
                        "carried `{name}` still on cell {position}"
                    )));
                }
                Ok(resource) if resource.position() != position => {
                    violations.push(InvariantViolation::new(format!(
                        "cell {position} holds `{name}` which is at {}",
                        resource.position()
                    )));
                }
                Ok(_) => {}
                Err(_) => violations.push(InvariantViolation::new(format!(
                    "cell {position} names unknown resource `{name}`"
                ))),
            }
        }
    }
}

fn check_agents(view: &WorldView<'_>, violations: &mut Vec<InvariantViolation>) {
    for agent in view.agents() {
        if agent.hp > agent.max_hp {
            violations.push(InvariantViolation::new(format!(
                "`{}` has {} HP > max {}",
                agent.name, agent.hp, agent.max_hp
            )));
        }
        let on_cell = view
            .cell(agent.position())
            .is_some_and(|c| c.agent.as_deref() == Some(agent.name.as_str()));
        if !on_cell {
            violations.push(InvariantViolation::new(format!(
                "`{}` missing from its cell {}",
                agent.name,
                agent.position()
            )));
        }
        if let Some(princess) = agent.carried.as_deref() {
            let linked = view
                .resource(princess)
                .is_ok_and(|r| r.carried_by.as_deref() == Some(agent.name.as_str()));
            if !linked {
                violations.push(InvariantViolation::new(format!(
                    "`{}` carries `{princess}` which does not point back",
                    agent.name
                )));
            }
        }
    }
}

/// Carry exclusivity: one carrier per princess, links symmetric, carried
/// princesses off the grid and ground princesses on it.
fn check_resources(view: &WorldView<'_>, violations: &mut Vec<InvariantViolation>) {
    let mut carriers: HashMap<&str, usize> = HashMap::new();
    for agent in view.agents() {
        if let Some(princess) = agent.carried.as_deref() {
            *carriers.entry(princess).or_default() += 1;
        }
    }
    for (princess, count) in &carriers {
        if *count > 1 {
            violations.push(InvariantViolation::new(format!(
                "`{princess}` carried by {count} agents"
            )));
        }
    }
    for resource in view.resources() {
        match resource.carried_by.as_deref() {
            Some(carrier) => {
                let linked = view
                    .agent(carrier)
                    .is_ok_and(|a| a.carried.as_deref() == Some(resource.name.as_str()));
                if !linked {
                    violations.push(InvariantViolation::new(format!(
                        "`{}` claims carrier `{carrier}` which does not hold it",
                        resource.name
                    )));
                }
            }
            None => {
                let on_cell = view
                    .cell(resource.position())
                    .is_some_and(|c| c.resource.as_deref() == Some(resource.name.as_str()));
                if !on_cell {
                    violations.push(InvariantViolation::new(format!(
                        "ground `{}` missing from its cell {}",
                        resource.name,
                        resource.position()
                    )));
                }
            }
        }
    }
}

/// Once won, no agent may sit in a state claiming the opposite result.
fn check_win(world: &World, view: &WorldView<'_>, violations: &mut Vec<InvariantViolation>) {
    let Some(winner) = world.winner() else {
        for agent in view.agents() {
            if matches!(agent.state, AgentState::MyTeamWon | AgentState::MyTeamLost) {
                violations.push(InvariantViolation::new(format!(
                    "`{}` in {} before any win",
                    agent.name, agent.state
                )));
            }
        }
        return;
    };
    for agent in view.agents() {
        let wrong = match agent.state {
            AgentState::MyTeamWon => agent.team != winner,
            AgentState::MyTeamLost => agent.team == winner,
            _ => false,
        };
        if wrong {
            violations.push(InvariantViolation::new(format!(
                "`{}` of team {} in {} but {winner} won",
                agent.name, agent.team, agent.state
            )));
        }
    }
}

/// Assert all world invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(world: &World) {
    let violations = check_invariants(world);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("World invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_world: &World) {}
