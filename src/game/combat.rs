//! Combat resolution: agent attacks, heals and structure damage.
//!
//! HP never goes below zero. A critical hit multiplies the attacker's power
//! for that one blow only; the stored attack power is never touched.

use tracing::debug;

use crate::error::{WorldError, WorldResult};
use crate::game::entity::{Role, StructureClass};
use crate::game::events::WorldEvent;
use crate::game::state::World;

/// Damage multiplier of a critical hit.
pub const CRIT_MULTIPLIER: u32 = 5;

/// Subtract one blow from `hp`, flooring at zero.
///
/// Returns `true` if this blow took `hp` from positive to zero.
#[must_use]
pub fn apply_damage(hp: &mut u32, power: u32, crit: bool) -> bool {
    if *hp == 0 {
        return false;
    }
    let damage = if crit {
        power.saturating_mul(CRIT_MULTIPLIER)
    } else {
        power
    };
    *hp = hp.saturating_sub(damage);
    *hp == 0
}

/// Restore `amount` HP, capped at `max_hp`.
///
/// Only applies when `0 < hp < max_hp`; returns whether anything changed.
#[must_use]
pub fn apply_heal(hp: &mut u32, max_hp: u32, amount: u32) -> bool {
    if *hp == 0 || *hp >= max_hp || amount == 0 {
        return false;
    }
    *hp = hp.saturating_add(amount).min(max_hp);
    true
}

impl World {
    /// Hit `target` with `attacker`'s attack power (×5 when `crit`).
    ///
    /// Returns `Ok(false)` if the target is already dead.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownAgent`] for either name, or a poisoned lock.
    pub fn attack_agent(&self, attacker: &str, target: &str, crit: bool) -> WorldResult<bool> {
        self.strike_agent(attacker, target, crit, None)
    }

    /// [`World::attack_agent`], refused for a teammate or a target farther
    /// than `reach`. Both positions are read under the same lock as the blow.
    pub(crate) fn strike_agent(
        &self,
        attacker: &str,
        target: &str,
        crit: bool,
        reach: Option<i32>,
    ) -> WorldResult<bool> {
        let mut agents = self.agents.write()?;
        let source = agents
            .get(attacker)
            .ok_or_else(|| WorldError::UnknownAgent(attacker.to_string()))?;
        let (power, side, origin) = (source.attack_power, source.team, source.position());
        let victim = agents
            .get_mut(target)
            .ok_or_else(|| WorldError::UnknownAgent(target.to_string()))?;
        if reach.is_some_and(|range| {
            victim.team == side || !victim.position().is_within(origin, range)
        }) {
            return Ok(false);
        }
        if !victim.is_alive() {
            return Ok(false);
        }
        let killed = apply_damage(&mut victim.hp, power, crit);
        let (hp, team) = (victim.hp, victim.team);
        drop(agents);

        debug!(attacker, target, crit, hp, "agent attacked");
        self.emit(WorldEvent::AgentDamaged {
            attacker: attacker.to_string(),
            target: target.to_string(),
            hp,
        });
        if killed {
            debug!(attacker, target, %team, "agent killed");
            self.emit(WorldEvent::AgentKilled {
                attacker: attacker.to_string(),
                target: target.to_string(),
                team,
            });
        }
        Ok(true)
    }

    /// Heal `target` by `healer`'s heal power, clamped to max HP.
    ///
    /// Only priests heal. A dead or full-health target is left alone.
    ///
    /// # Errors
    ///
    /// [`WorldError::UnknownAgent`] for either name, or a poisoned lock.
    pub fn heal_agent(&self, healer: &str, target: &str) -> WorldResult<bool> {
        self.mend_agent(healer, target, None)
    }

    /// [`World::heal_agent`], refused for an enemy or a patient farther
    /// than `reach`.
    pub(crate) fn mend_agent(
        &self,
        healer: &str,
        target: &str,
        reach: Option<i32>,
    ) -> WorldResult<bool> {
        let mut agents = self.agents.write()?;
        let source = agents
            .get(healer)
            .ok_or_else(|| WorldError::UnknownAgent(healer.to_string()))?;
        let (role, amount, side, origin) =
            (source.role, source.heal_power, source.team, source.position());
        let patient = agents
            .get_mut(target)
            .ok_or_else(|| WorldError::UnknownAgent(target.to_string()))?;
        if reach.is_some_and(|range| {
            patient.team != side || !patient.position().is_within(origin, range)
        }) {
            return Ok(false);
        }
        if role != Role::Priest {
            return Ok(false);
        }
        if !apply_heal(&mut patient.hp, patient.max_hp, amount) {
            return Ok(false);
        }
        let hp = patient.hp;
        drop(agents);

        debug!(healer, target, hp, "agent healed");
        self.emit(WorldEvent::AgentHealed {
            healer: healer.to_string(),
            target: target.to_string(),
            hp,
        });
        Ok(true)
    }

    /// Damage a gate.
    ///
    /// # Errors
    ///
    /// Unknown names or a poisoned lock.
    pub fn attack_gate(&self, attacker: &str, gate: &str) -> WorldResult<bool> {
        self.attack_structure(attacker, gate, StructureClass::Gate, None)
    }

    /// Damage a tree. Felling it credits one wood to the attacker's team and
    /// schedules regrowth.
    ///
    /// # Errors
    ///
    /// Unknown names or a poisoned lock.
    pub fn attack_tree(&self, attacker: &str, tree: &str) -> WorldResult<bool> {
        self.attack_structure(attacker, tree, StructureClass::Tree, None)
    }

    /// Damage a structure of `class`. With `reach`, the attacker's own gates
    /// and anything farther than `reach` are refused.
    pub(crate) fn attack_structure(
        &self,
        attacker: &str,
        target: &str,
        class: StructureClass,
        reach: Option<i32>,
    ) -> WorldResult<bool> {
        let mut structures = self.structures.write()?;
        let agents = self.agents.read()?;
        let source = agents
            .get(attacker)
            .ok_or_else(|| WorldError::UnknownAgent(attacker.to_string()))?;
        let (power, team, origin) = (source.attack_power, source.team, source.position());
        let structure = structures
            .get_mut(target)
            .ok_or_else(|| WorldError::UnknownStructure(target.to_string()))?;
        if structure.kind.class() != class || structure.hp == 0 {
            return Ok(false);
        }
        if reach.is_some_and(|range| {
            structure.team == Some(team) || !structure.position().is_within(origin, range)
        }) {
            return Ok(false);
        }
        let destroyed = apply_damage(&mut structure.hp, power, false);
        if destroyed && class == StructureClass::Tree {
            structure.regrow_at = Some(self.tick().saturating_add(self.config().tree_regrow_ticks));
        }
        let hp = structure.hp;
        drop(agents);
        drop(structures);

        debug!(attacker, target, hp, "structure attacked");
        self.emit(WorldEvent::StructureDamaged {
            structure: target.to_string(),
            hp,
        });
        if destroyed {
            debug!(attacker, target, "structure destroyed");
            self.emit(WorldEvent::StructureDestroyed {
                structure: target.to_string(),
            });
            if class == StructureClass::Tree {
                self.gather_wood(team);
            }
        }
        Ok(true)
    }
}

/// Kani formal verification proofs.
///
/// Run with: `cargo kani`
#[cfg(kani)]
mod kani_proofs {
    use super::*;

    /// Damage never underflows and a crit never hits softer than a normal blow.
    #[kani::proof]
    fn prove_damage_floor() {
        let start: u32 = kani::any();
        let power: u32 = kani::any();
        let mut normal = start;
        let mut crit = start;
        let _ = apply_damage(&mut normal, power, false);
        let _ = apply_damage(&mut crit, power, true);
        assert!(normal <= start);
        assert!(crit <= normal);
    }

    /// Heals never exceed the maximum.
    #[kani::proof]
    fn prove_heal_clamped() {
        let mut hp: u32 = kani::any();
        let max_hp: u32 = kani::any();
        let amount: u32 = kani::any();
        kani::assume(hp <= max_hp);
        let _ = apply_heal(&mut hp, max_hp, amount);
        assert!(hp <= max_hp);
    }
}
