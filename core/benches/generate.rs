use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use trapmaze_core::*;

fn bench_generate(c: &mut Criterion) {
    let dense = GameConfig::new((10, 10), 98, INITIAL_SECONDS, GoalPlacement::Fixed)
        .expect("dense config should be valid");
    let configs = [
        ("classic", GameConfig::CLASSIC),
        ("scattered", GameConfig::SCATTERED),
        ("dense", dense),
    ];

    let mut group = c.benchmark_group("generate");
    for (name, config) in configs {
        group.bench_function(name, |b| {
            let mut generator = RandomMazeGenerator::from_seed(0);
            b.iter(|| generator.generate(black_box(&config)))
        });
    }
    group.finish();
}

fn bench_reset(c: &mut Criterion) {
    c.bench_function("reset_classic", |b| {
        let mut engine =
            GameEngine::from_seed(GameConfig::CLASSIC, 0).expect("classic config should be valid");
        b.iter(|| engine.reset())
    });
}

criterion_group!(benches, bench_generate, bench_reset);
criterion_main!(benches);
