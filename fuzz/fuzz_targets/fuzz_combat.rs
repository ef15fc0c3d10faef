#![no_main]

use arbitrary::Arbitrary;
use black_forest::game::{apply_damage, apply_heal, check_invariants};
use black_forest::{GameConfig, Role, SpawnRequest, Team, Vector2D, World};
use libfuzzer_sys::fuzz_target;

/// One blow or heal between the three duellists.
#[derive(Arbitrary, Debug)]
struct Exchange {
    /// Index of the acting agent.
    actor: u8,
    /// Index of the target agent.
    target: u8,
    /// Heal instead of attacking.
    heal: bool,
    /// Critical hit.
    crit: bool,
}

/// Structured input for combat fuzzing.
#[derive(Arbitrary, Debug)]
struct CombatInput {
    /// Raw HP for the pure damage/heal arithmetic.
    hp: u32,
    /// Raw max HP for the pure heal arithmetic.
    max_hp: u32,
    /// Raw power.
    power: u32,
    /// Exchanges played on the world.
    exchanges: Vec<Exchange>,
}

const DUELLISTS: [(&str, Role, Team, i32); 3] = [
    ("warrior_b1", Role::Warrior, Team::Blue, 10),
    ("priest_b1", Role::Priest, Team::Blue, 11),
    ("archer_r1", Role::Archer, Team::Red, 12),
];

fuzz_target!(|input: CombatInput| {
    let mut hp = input.hp;
    let _ = apply_damage(&mut hp, input.power, false);
    assert!(hp <= input.hp);

    let max_hp = input.max_hp;
    let mut hp = input.hp.min(max_hp);
    let _ = apply_heal(&mut hp, max_hp, input.power);
    assert!(hp <= max_hp);

    let Ok(world) = World::generate(&GameConfig::default()) else {
        return;
    };
    for (name, role, team, x) in DUELLISTS {
        if world
            .add_agent_at(&SpawnRequest::new(name, role, team), Vector2D::new(x, 7))
            .is_err()
        {
            return;
        }
    }

    // Cap inputs to keep runs short
    for exchange in input.exchanges.iter().take(256) {
        let (actor, ..) = DUELLISTS[usize::from(exchange.actor) % DUELLISTS.len()];
        let (target, ..) = DUELLISTS[usize::from(exchange.target) % DUELLISTS.len()];
        let before = world.get_agent_by_name(target).ok().flatten().map(|a| a.hp);
        let result = if exchange.heal {
            world.heal_agent(actor, target)
        } else {
            world.attack_agent(actor, target, exchange.crit)
        };
        let applied = result.expect("known names never error");
        let after = world.get_agent_by_name(target).ok().flatten().map(|a| a.hp);
        if before == Some(0) {
            assert!(!applied);
            assert_eq!(after, Some(0));
        }
    }

    let violations = check_invariants(&world);
    assert!(violations.is_empty(), "{violations:?}");
});
