#![no_main]

use arbitrary::Arbitrary;
use black_forest::game::{check_invariants, StructureClass, WoodStock, ENOUGH_WOOD_AMOUNT};
use black_forest::{GameConfig, Role, SpawnRequest, Team, Vector2D, World};
use libfuzzer_sys::fuzz_target;

/// One economy operation.
#[derive(Arbitrary, Debug)]
enum Op {
    /// Chop tree `n` (modulo the tree count).
    Chop(u8),
    /// Hit gate `n` (modulo four).
    Smash(u8),
    /// Repair gate `n` (modulo four).
    Repair(u8),
    /// Gather directly into a stock.
    Gather(bool),
    /// Spend from a stock.
    Spend(bool, u8),
}

const GATES: [&str; 4] = ["gate_b1", "gate_b2", "gate_r1", "gate_r2"];

fuzz_target!(|ops: Vec<Op>| {
    let stock = WoodStock::default();
    let Ok(world) = World::generate(&GameConfig::default()) else {
        return;
    };
    let agents = [
        ("gatherer_b1", Team::Blue, 10),
        ("gatherer_r1", Team::Red, 30),
    ];
    for (name, team, x) in agents {
        if world
            .add_agent_at(&SpawnRequest::new(name, Role::Gatherer, team), Vector2D::new(x, 7))
            .is_err()
        {
            return;
        }
    }
    let trees: Vec<String> = match world.view() {
        Ok(view) => view
            .structures()
            .filter(|s| s.kind.class() == StructureClass::Tree)
            .map(|s| s.name.clone())
            .collect(),
        Err(_) => return,
    };
    if trees.is_empty() {
        return;
    }

    // Cap inputs to keep runs short
    for (i, op) in ops.iter().take(512).enumerate() {
        let (actor, team, _) = agents[i % agents.len()];
        let wood = world.wood_amount(team);
        match *op {
            Op::Chop(n) => {
                let tree = &trees[usize::from(n) % trees.len()];
                let _ = world.attack_tree(actor, tree);
                let now = world.wood_amount(team);
                assert!(now == wood || now == wood + 1);
            }
            Op::Smash(n) => {
                let _ = world.attack_gate(actor, GATES[usize::from(n) % GATES.len()]);
                assert_eq!(world.wood_amount(team), wood);
            }
            Op::Repair(n) => {
                let repaired = world
                    .repair_gate(actor, GATES[usize::from(n) % GATES.len()])
                    .unwrap_or(false);
                let now = world.wood_amount(team);
                if repaired {
                    assert!(wood >= ENOUGH_WOOD_AMOUNT);
                    assert_eq!(now, wood - ENOUGH_WOOD_AMOUNT);
                } else {
                    assert_eq!(now, wood);
                }
            }
            Op::Gather(red) => {
                let team = if red { Team::Red } else { Team::Blue };
                let before = stock.amount(team);
                assert_eq!(stock.gather(team), before + 1);
            }
            Op::Spend(red, amount) => {
                let team = if red { Team::Red } else { Team::Blue };
                let before = stock.amount(team);
                let spent = stock.try_spend(team, u32::from(amount));
                assert_eq!(spent, before >= u32::from(amount));
                let after = stock.amount(team);
                if spent {
                    assert_eq!(after, before - u32::from(amount));
                } else {
                    assert_eq!(after, before);
                }
            }
        }
        if i % 16 == 15 {
            let _ = world.step();
        }
    }

    let violations = check_invariants(&world);
    assert!(violations.is_empty(), "{violations:?}");
});
