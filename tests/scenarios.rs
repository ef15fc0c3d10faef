//! End-to-end rule scenarios on the generated 40×15 map.
//!
//! Agents are placed on row 7, which the generator keeps free of trees
//! between the base approaches and the river.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use black_forest::game::{check_invariants, StructureClass, ENOUGH_WOOD_AMOUNT};
use black_forest::{
    AgentState, GameConfig, Orientation, Role, SpawnRequest, Team, Vector2D, World,
};

fn world() -> World {
    World::generate(&GameConfig::default()).unwrap()
}

fn place(world: &World, name: &str, role: Role, team: Team, x: i32, y: i32) {
    world
        .add_agent_at(&SpawnRequest::new(name, role, team), Vector2D::new(x, y))
        .unwrap();
}

fn hp(world: &World, name: &str) -> u32 {
    world.get_agent_by_name(name).unwrap().unwrap().hp
}

fn position(world: &World, name: &str) -> Vector2D {
    world.get_agent_by_name(name).unwrap().unwrap().position()
}

#[test]
fn test_spawned_warrior_heads_for_nearest_own_gate() {
    let world = world();
    let request = SpawnRequest::new("warrior_b1", Role::Warrior, Team::Blue);
    assert!(world.ensure_agent(&request).unwrap());
    assert!(world.spawn_agent("warrior_b1").unwrap());

    let agent = world.get_agent_by_name("warrior_b1").unwrap().unwrap();
    assert_eq!(agent.state, AgentState::Spawn);

    let objective = world.closest_objective("warrior_b1").unwrap();
    assert_eq!(objective.state, AgentState::ExitFromAllyBase);

    let gates: Vec<Vector2D> = ["gate_b1", "gate_b2"]
        .iter()
        .map(|name| world.get_structure_by_name(name).unwrap().unwrap().position())
        .collect();
    let target = objective.target.unwrap();
    assert!(gates.contains(&target));
    let best = gates
        .iter()
        .map(|gate| gate.distance_squared(agent.position()))
        .min()
        .unwrap();
    assert_eq!(target.distance_squared(agent.position()), best);
}

#[test]
fn test_critical_blow_kills_and_dead_target_ignores_attacks() {
    let world = world();
    place(&world, "warrior_b1", Role::Warrior, Team::Blue, 10, 7);
    place(&world, "warrior_r1", Role::Warrior, Team::Red, 11, 7);

    for _ in 0..9 {
        assert!(world.attack_agent("warrior_b1", "warrior_r1", false).unwrap());
    }
    assert_eq!(hp(&world, "warrior_r1"), 10);

    assert!(world.attack_agent("warrior_b1", "warrior_r1", true).unwrap());
    assert_eq!(hp(&world, "warrior_r1"), 0);

    assert!(!world.attack_agent("warrior_b1", "warrior_r1", false).unwrap());
    assert_eq!(hp(&world, "warrior_r1"), 0);
    assert!(check_invariants(&world).is_empty());
}

#[test]
fn test_move_onto_enemy_agent_is_refused() {
    let world = world();
    place(&world, "warrior_b1", Role::Warrior, Team::Blue, 10, 7);
    place(&world, "warrior_r1", Role::Warrior, Team::Red, 11, 7);

    let moved = world
        .move_agent("warrior_b1", Vector2D::new(11, 7), Orientation::East)
        .unwrap();
    assert!(!moved);
    assert_eq!(position(&world, "warrior_b1"), Vector2D::new(10, 7));
    assert_eq!(position(&world, "warrior_r1"), Vector2D::new(11, 7));
}

#[test]
fn test_rescue_home_wins_and_objectives_stay_terminal() {
    let world = world();
    world
        .ensure_agent(&SpawnRequest::new("warrior_b1", Role::Warrior, Team::Blue))
        .unwrap();
    place(&world, "warrior_r1", Role::Warrior, Team::Red, 25, 7);

    assert!(world.pick_up_princess("warrior_b1", "princess_b").unwrap());
    let objective = world.closest_objective("warrior_b1").unwrap();
    assert_eq!(objective.state, AgentState::MyTeamWon);
    assert_eq!(world.winner(), Some(Team::Blue));

    for _ in 0..3 {
        world.step().unwrap();
        let won = world.closest_objective("warrior_b1").unwrap();
        let lost = world.closest_objective("warrior_r1").unwrap();
        assert_eq!(won.state, AgentState::MyTeamWon);
        assert_eq!(lost.state, AgentState::MyTeamLost);
    }
    assert_eq!(world.winner(), Some(Team::Blue));
    assert!(check_invariants(&world).is_empty());
}

#[test]
fn test_carried_princess_cannot_be_taken_twice() {
    let world = world();
    world
        .ensure_agent(&SpawnRequest::new("warrior_r1", Role::Warrior, Team::Red))
        .unwrap();
    world
        .ensure_agent(&SpawnRequest::new("archer_r1", Role::Archer, Team::Red))
        .unwrap();

    assert!(world.pick_up_princess("warrior_r1", "princess_r").unwrap());
    assert!(!world.pick_up_princess("archer_r1", "princess_r").unwrap());

    let princess = world.get_resource_by_name("princess_r").unwrap().unwrap();
    assert_eq!(princess.carried_by.as_deref(), Some("warrior_r1"));
    assert!(check_invariants(&world).is_empty());
}

#[test]
fn test_felled_trees_pay_for_one_gate_repair() {
    let world = world();
    place(&world, "gatherer_b1", Role::Gatherer, Team::Blue, 10, 7);
    place(&world, "warrior_r1", Role::Warrior, Team::Red, 11, 7);

    while world.attack_gate("warrior_r1", "gate_b1").unwrap() {}
    let gate = world.get_structure_by_name("gate_b1").unwrap().unwrap();
    assert!(gate.is_destroyed());
    assert!(!world.repair_gate("gatherer_b1", "gate_b1").unwrap());

    let trees: Vec<String> = world
        .view()
        .unwrap()
        .structures()
        .filter(|s| s.kind.class() == StructureClass::Tree)
        .map(|s| s.name.clone())
        .take(usize::try_from(ENOUGH_WOOD_AMOUNT).unwrap())
        .collect();
    assert_eq!(trees.len(), 5);
    for tree in &trees {
        while world.attack_tree("gatherer_b1", tree).unwrap() {}
    }
    assert_eq!(world.wood_amount(Team::Blue), ENOUGH_WOOD_AMOUNT);
    assert_eq!(world.wood_amount(Team::Red), 0);

    assert!(world.repair_gate("gatherer_b1", "gate_b1").unwrap());
    assert_eq!(world.wood_amount(Team::Blue), 0);
    let gate = world.get_structure_by_name("gate_b1").unwrap().unwrap();
    assert_eq!(gate.hp, gate.max_hp);
    assert!(!world.repair_gate("gatherer_b1", "gate_b1").unwrap());
}

#[test]
fn test_fallen_agent_respawns_dead_then_resets() {
    let config = GameConfig {
        respawn_ticks: 2,
        ..GameConfig::default()
    };
    let world = World::generate(&config).unwrap();
    place(&world, "warrior_b1", Role::Warrior, Team::Blue, 10, 7);
    place(&world, "warrior_r1", Role::Warrior, Team::Red, 11, 7);
    assert!(world.attack_agent("warrior_b1", "warrior_r1", true).unwrap());
    assert!(world.attack_agent("warrior_b1", "warrior_r1", true).unwrap());
    assert_eq!(hp(&world, "warrior_r1"), 0);

    let report = world.step().unwrap();
    assert_eq!(report.respawned, vec!["warrior_r1".to_string()]);
    let fallen = world.get_agent_by_name("warrior_r1").unwrap().unwrap();
    assert_eq!(fallen.state, AgentState::Dead);
    assert_eq!(world.layout().side_of(fallen.position().x), Some(Team::Red));

    let mut reset = false;
    for _ in 0..3 {
        reset |= world.step().unwrap().reset.contains(&"warrior_r1".to_string());
    }
    assert!(reset);
    let back = world.get_agent_by_name("warrior_r1").unwrap().unwrap();
    assert_eq!(back.hp, back.max_hp);
    assert_eq!(back.state, AgentState::Spawn);
    assert!(check_invariants(&world).is_empty());
}
