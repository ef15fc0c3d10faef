//! Many threads acting on one shared world.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Barrier};
use std::thread;

use black_forest::game::check_invariants;
use black_forest::simulation::{roster_requests, Bot};
use black_forest::{
    Action, ActionHandler, ActionRequest, Direction, GameConfig, Role, SpawnRequest, Team, World,
};

fn shared_world(seed: u64) -> (Arc<World>, ActionHandler) {
    let config = GameConfig {
        seed,
        ..GameConfig::default()
    };
    let world = Arc::new(World::generate(&config).unwrap());
    let handler = ActionHandler::new(Arc::clone(&world));
    (world, handler)
}

#[test]
fn test_random_walkers_never_share_a_cell() {
    let (world, handler) = shared_world(3);
    let requests: Vec<SpawnRequest> = (0..8)
        .map(|i| {
            let team = if i % 2 == 0 { Team::Blue } else { Team::Red };
            SpawnRequest::new(format!("warrior_{}{i}", team.suffix()), Role::Warrior, team)
        })
        .collect();

    thread::scope(|scope| {
        for request in &requests {
            let handler = handler.clone();
            scope.spawn(move || {
                for _ in 0..200 {
                    let action = Action::MoveStep {
                        step: 1,
                        direction: Direction::Random,
                    };
                    handler
                        .handle(&ActionRequest::new(request.clone(), action))
                        .unwrap();
                }
            });
        }
    });

    assert_eq!(world.list_agents().unwrap().len(), 8);
    let violations = check_invariants(&world);
    assert!(violations.is_empty(), "{violations:?}");
}

#[test]
fn test_one_winner_of_a_princess_race() {
    let (world, _handler) = shared_world(5);
    let racers: Vec<SpawnRequest> = (1..=6)
        .map(|i| SpawnRequest::new(format!("warrior_r{i}"), Role::Warrior, Team::Red))
        .collect();
    for racer in &racers {
        world.ensure_agent(racer).unwrap();
    }

    let barrier = Barrier::new(racers.len());
    let taken: Vec<bool> = thread::scope(|scope| {
        let handles: Vec<_> = racers
            .iter()
            .map(|racer| {
                let barrier = &barrier;
                let world = &world;
                scope.spawn(move || {
                    barrier.wait();
                    world.pick_up_princess(&racer.name, "princess_r").unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(taken.iter().filter(|&&t| t).count(), 1);
    let carriers = world
        .list_agents()
        .unwrap()
        .into_iter()
        .filter(|a| a.carried.is_some())
        .count();
    assert_eq!(carriers, 1);
    assert!(check_invariants(&world).is_empty());
}

#[test]
fn test_bots_on_threads_keep_invariants() {
    let config = GameConfig::default();
    let (world, handler) = shared_world(config.seed);
    let mut bots: Vec<Bot> = roster_requests(&config)
        .into_iter()
        .zip(0u64..)
        .map(|(request, stream)| Bot::new(request, config.seed, stream))
        .collect();

    for _ in 0..40 {
        thread::scope(|scope| {
            for bot in &mut bots {
                let handler = &handler;
                scope.spawn(move || bot.act(handler).unwrap());
            }
        });
        world.step().unwrap();
        let violations = check_invariants(&world);
        assert!(violations.is_empty(), "tick {}: {violations:?}", world.tick());
    }
    assert_eq!(
        world.list_agents().unwrap().len(),
        usize::try_from(config.roster.total() * 2).unwrap()
    );
}

#[test]
fn test_parallel_match_completes() {
    let config = GameConfig {
        max_ticks: 150,
        parallel: true,
        ..GameConfig::default()
    };
    let result = black_forest::run_match(&config).unwrap();
    assert!(result.ticks <= 150);
    assert!(result.winner.is_some() || result.ticks == 150);
}
