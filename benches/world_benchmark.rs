//! Benchmarks for map generation, objective queries and short matches.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::hint::black_box;

use black_forest::game::generate_map;
use black_forest::{run_match, GameConfig, Role, SpawnRequest, Team, Vector2D, World};
use criterion::{criterion_group, criterion_main, Criterion};

fn bench_map_generation(c: &mut Criterion) {
    c.bench_function("generate_map_40x15", |b| {
        b.iter(|| generate_map(black_box(42), black_box(40), black_box(15)).unwrap());
    });

    c.bench_function("generate_map_120x45", |b| {
        b.iter(|| generate_map(black_box(42), black_box(120), black_box(45)).unwrap());
    });
}

fn bench_objective_queries(c: &mut Criterion) {
    let world = World::generate(&GameConfig::default()).unwrap();
    for (i, x) in [10, 12, 14, 16].into_iter().enumerate() {
        world
            .add_agent_at(
                &SpawnRequest::new(format!("warrior_b{i}"), Role::Warrior, Team::Blue),
                Vector2D::new(x, 7),
            )
            .unwrap();
    }
    world
        .add_agent_at(
            &SpawnRequest::new("gatherer_r1", Role::Gatherer, Team::Red),
            Vector2D::new(28, 7),
        )
        .unwrap();

    c.bench_function("closest_objective_warrior", |b| {
        b.iter(|| world.closest_objective(black_box("warrior_b0")).unwrap());
    });

    c.bench_function("closest_objective_gatherer", |b| {
        b.iter(|| world.closest_objective(black_box("gatherer_r1")).unwrap());
    });

    c.bench_function("agents_neighboring", |b| {
        b.iter(|| world.agents_neighboring(black_box("warrior_b1"), 3).unwrap());
    });
}

fn bench_short_match(c: &mut Criterion) {
    let sequential = GameConfig {
        max_ticks: 200,
        parallel: false,
        ..GameConfig::default()
    };
    let parallel = GameConfig {
        parallel: true,
        ..sequential
    };

    let mut group = c.benchmark_group("match_200_ticks");
    group.sample_size(20);
    group.bench_function("sequential", |b| {
        b.iter(|| run_match(black_box(&sequential)).unwrap());
    });
    group.bench_function("parallel", |b| {
        b.iter(|| run_match(black_box(&parallel)).unwrap());
    });
    group.finish();
}

criterion_group!(benches, bench_map_generation, bench_objective_queries, bench_short_match);
criterion_main!(benches);
