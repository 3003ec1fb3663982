use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use recon_score::{DiffBuilder, ScoreConfig, ScoreEngine};
use recon_test_utils::seeded_instance;
use recon_trace::{CandidatePool, Position};

fn bench_stage_discard(c: &mut Criterion) {
    let mut group = c.benchmark_group("stage_score_discard");
    for vertices in [30usize, 90, 180] {
        group.bench_with_input(BenchmarkId::from_parameter(vertices), &vertices, |b, &n| {
            let instance = seeded_instance(1, n, 3, n * 6);
            let mut rng = StdRng::seed_from_u64(2);
            let store = instance.scrambled_store(&mut rng);
            let pool = CandidatePool::new(n);
            let mut engine = ScoreEngine::from_store(&store, ScoreConfig::default());
            b.iter(|| {
                let trace = rng.gen_range(0..store.trace_count());
                let position = Position::new(trace, rng.gen_range(1..=store.trace(trace).len()));
                let vertex = pool.draw(store.required_label(position), &mut rng);
                let changes = DiffBuilder::single(&store, position, vertex);
                engine.stage(&changes).ok();
                let delta = black_box(engine.score_delta_value());
                engine.discard();
                delta
            });
        });
    }
    group.finish();
}

fn bench_full_rescan(c: &mut Criterion) {
    let instance = seeded_instance(1, 90, 3, 540);
    let mut rng = StdRng::seed_from_u64(2);
    let store = instance.scrambled_store(&mut rng);
    let mut engine = ScoreEngine::new(ScoreConfig::default());
    c.bench_function("full_rescan_90", |b| {
        b.iter(|| black_box(engine.full_rescan(black_box(&store))));
    });
}

criterion_group!(benches, bench_stage_discard, bench_full_rescan);
criterion_main!(benches);
