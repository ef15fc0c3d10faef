//! Wood economy: per-team stocks, tree harvesting and gate repair.

use std::sync::atomic::{AtomicU32, Ordering};

use tracing::debug;

use crate::error::{WorldError, WorldResult};
use crate::game::entity::{StructureKind, Team};
use crate::game::events::WorldEvent;
use crate::game::state::World;

/// Wood needed to repair one destroyed gate.
pub const ENOUGH_WOOD_AMOUNT: u32 = 5;

/// Team stock at which gatherers stop chopping and join the advance.
pub const WOOD_STOCKPILE: u32 = 2 * ENOUGH_WOOD_AMOUNT;

/// Lock-free per-team wood counters.
#[derive(Debug, Default)]
pub struct WoodStock {
    red: AtomicU32,
    blue: AtomicU32,
}

impl WoodStock {
    const fn counter(&self, team: Team) -> &AtomicU32 {
        match team {
            Team::Red => &self.red,
            Team::Blue => &self.blue,
        }
    }

    /// Current stock of `team`.
    #[must_use]
    pub fn amount(&self, team: Team) -> u32 {
        self.counter(team).load(Ordering::SeqCst)
    }

    /// Whether `team` can afford a repair.
    #[must_use]
    pub fn is_enough(&self, team: Team) -> bool {
        self.amount(team) >= ENOUGH_WOOD_AMOUNT
    }

    /// Credit one unit of wood. Returns the new stock.
    pub fn gather(&self, team: Team) -> u32 {
        let previous = self
            .counter(team)
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |w| Some(w.saturating_add(1)))
            .unwrap_or_else(|current| current);
        previous.saturating_add(1)
    }

    /// Debit `amount` if the stock covers it. Never goes negative.
    pub fn try_spend(&self, team: Team, amount: u32) -> bool {
        self.counter(team)
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |w| w.checked_sub(amount))
            .is_ok()
    }
}

impl World {
    /// Wood stock of `team`.
    #[must_use]
    pub fn wood_amount(&self, team: Team) -> u32 {
        self.wood.amount(team)
    }

    /// Whether `team` holds at least [`ENOUGH_WOOD_AMOUNT`] wood.
    #[must_use]
    pub fn is_enough_wood(&self, team: Team) -> bool {
        self.wood.is_enough(team)
    }

    /// Credit one wood to `team` (a tree was destroyed).
    pub(crate) fn gather_wood(&self, team: Team) -> u32 {
        let total = self.wood.gather(team);
        self.emit(WorldEvent::WoodGathered { team, total });
        total
    }

    /// Restore a destroyed own gate to full HP for [`ENOUGH_WOOD_AMOUNT`] wood.
    ///
    /// Fails (`Ok(false)`) unless the gate is destroyed, belongs to the
    /// repairer's team, has nothing standing on it, and the team can pay.
    ///
    /// # Errors
    ///
    /// Unknown names or poisoned locks.
    pub fn repair_gate(&self, repairer: &str, gate: &str) -> WorldResult<bool> {
        let grid = self.grid_read()?;
        let mut structures = self.structures.write()?;
        let agents = self.agents.read()?;

        let team = agents
            .get(repairer)
            .ok_or_else(|| WorldError::UnknownAgent(repairer.to_string()))?
            .team;
        let target = structures
            .get_mut(gate)
            .ok_or_else(|| WorldError::UnknownStructure(gate.to_string()))?;

        if target.kind != StructureKind::Gate || !target.is_destroyed() {
            return Ok(false);
        }
        if target.team != Some(team) {
            return Ok(false);
        }
        let blocked = grid
            .get(target.position())
            .is_some_and(|cell| cell.agent.is_some() || cell.resource.is_some());
        if blocked {
            return Ok(false);
        }
        if !self.wood.try_spend(team, ENOUGH_WOOD_AMOUNT) {
            return Ok(false);
        }

        target.hp = target.max_hp;
        debug!(repairer, gate, %team, wood = self.wood.amount(team), "gate repaired");
        self.emit(WorldEvent::GateRepaired {
            gate: gate.to_string(),
            team,
        });
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wood_stock_gather_and_spend() {
        let stock = WoodStock::default();
        assert_eq!(stock.amount(Team::Red), 0);
        assert!(!stock.is_enough(Team::Red));
        for i in 1..=5 {
            assert_eq!(stock.gather(Team::Red), i);
        }
        assert!(stock.is_enough(Team::Red));
        assert_eq!(stock.amount(Team::Blue), 0);

        assert!(stock.try_spend(Team::Red, ENOUGH_WOOD_AMOUNT));
        assert_eq!(stock.amount(Team::Red), 0);
        assert!(!stock.try_spend(Team::Red, 1));
        assert_eq!(stock.amount(Team::Red), 0);
    }

    #[test]
    fn test_concurrent_spend_never_negative() {
        let stock = WoodStock::default();
        for _ in 0..12 {
            stock.gather(Team::Blue);
        }
        let successes: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| stock.try_spend(Team::Blue, ENOUGH_WOOD_AMOUNT)))
                .collect();
            handles
                .into_iter()
                .map(|h| usize::from(h.join().unwrap()))
                .sum()
        });
        assert_eq!(successes, 2);
        assert_eq!(stock.amount(Team::Blue), 2);
    }
}
