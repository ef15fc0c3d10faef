#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use black_forest::game::check_invariants;
use black_forest::{
    Action, ActionHandler, ActionRequest, AgentState, Direction, GameConfig, Orientation, Role,
    SpawnRequest, Team, Vector2D,
};
use black_forest::World;
use libfuzzer_sys::fuzz_target;

/// One request from one of eight agents.
#[derive(Arbitrary, Debug)]
struct RawAction {
    agent: u8,
    kind: u8,
    target: u8,
    x: i8,
    y: i8,
    step: i32,
    crit: bool,
}

/// Structured input for action-stream fuzzing.
#[derive(Arbitrary, Debug)]
struct Input {
    seed: u64,
    actions: Vec<RawAction>,
}

const NAMES: [&str; 8] = [
    "warrior_b1", "archer_b1", "priest_b1", "gatherer_b1",
    "warrior_r1", "archer_r1", "priest_r1", "gatherer_r1",
];
const TARGETS: [&str; 10] = [
    "warrior_b1", "warrior_r1", "gate_b1", "gate_r2", "princess_b",
    "princess_r", "tree_0", "tree_3", "priest_r1", "ghost",
];

fn request(index: u8) -> SpawnRequest {
    let slot = usize::from(index) % NAMES.len();
    let role = Role::ALL[slot % Role::ALL.len()];
    let team = if slot < 4 { Team::Blue } else { Team::Red };
    SpawnRequest::new(NAMES[slot], role, team)
}

fn action(raw: &RawAction) -> Action {
    let target = TARGETS[usize::from(raw.target) % TARGETS.len()].to_string();
    match raw.kind % 12 {
        0 => Action::MoveStep {
            // Mostly short walks, sometimes any step size at all.
            step: if raw.crit { raw.step } else { i32::from(raw.x % 3) },
            direction: Direction::CONCRETE[usize::from(raw.target) % 4],
        },
        1 => Action::MoveTo {
            target: Vector2D::new(i32::from(raw.x), i32::from(raw.y)),
            orientation: Orientation::ALL[usize::from(raw.target) % 4],
        },
        2 => Action::Attack { target, crit: raw.crit },
        3 => Action::Heal { target },
        4 => Action::AttackGate { gate: target },
        5 => Action::AttackTree { tree: target },
        6 => Action::RepairGate { gate: target },
        7 => Action::PickUp { princess: target },
        8 => Action::Drop,
        9 => Action::Spawn,
        10 => Action::Reset,
        _ => Action::SetState {
            state: AgentState::parse_lossy(&target),
        },
    }
}

fuzz_target!(|input: Input| {
    let config = GameConfig {
        seed: input.seed,
        ..GameConfig::default()
    };
    let Ok(world) = World::generate(&config) else {
        return;
    };
    let world = Arc::new(world);
    let handler = ActionHandler::new(Arc::clone(&world));
    let mut winner = None;

    // Cap inputs to keep runs short
    for (i, raw) in input.actions.iter().take(1024).enumerate() {
        let request = ActionRequest::new(request(raw.agent), action(raw));
        let _ = handler.handle(&request);
        if i % 8 == 7 {
            let _ = world.step();
            let _ = world.closest_objective(&request.agent.name);
        }
        if let Some(previous) = winner {
            assert_eq!(world.winner(), Some(previous));
        }
        winner = world.winner();
    }

    let violations = check_invariants(&world);
    assert!(violations.is_empty(), "{violations:?}");
});
