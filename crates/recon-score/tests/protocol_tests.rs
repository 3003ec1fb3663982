use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use recon_score::{ChangeSet, DiffBuilder, ScoreConfig, ScoreEngine, ScoreError};
use recon_test_utils::{four_vertex_instance, seeded_instance, seeded_layered_instance, seeded_override_instance};
use recon_trace::{CandidatePool, DoorKey, Mirror, Orientation, Position, Reassignment, Recode, TraceStore, Vertex};

fn random_position<O: Orientation, R: Rng>(store: &TraceStore<O>, rng: &mut R) -> Position {
    let trace = rng.gen_range(0..store.trace_count());
    let step = rng.gen_range(1..=store.trace(trace).len());
    Position::new(trace, step)
}

fn counters(engine: &ScoreEngine) -> (Vec<Vec<i32>>, Vec<i32>, Vec<i32>) {
    let n = engine.vertex_count();
    let doors: Vec<DoorKey> = (0..n * recon_trace::DOOR_COUNT).map(DoorKey::from_index).collect();
    (
        doors.iter().map(|&d| engine.door_votes(d).to_vec()).collect(),
        doors.iter().map(|&d| engine.door_total(d)).collect(),
        (0..n).map(|v| engine.degree(Vertex::from_index(v))).collect(),
    )
}

#[test]
fn solved_four_vertex_instance_scores_zero() {
    let instance = four_vertex_instance();
    let engine = ScoreEngine::from_store(&instance.solved_store(), ScoreConfig::default());
    assert!(engine.score().is_zero());
    assert!(engine.bad_positions().is_empty());
}

#[test]
fn single_move_dirties_only_adjacent_edges() {
    let instance = seeded_instance(11, 12, 2, 40);
    let store = instance.solved_store();
    let mut engine = ScoreEngine::from_store(&store, ScoreConfig::default());

    let position = Position::new(0, 5);
    let old = store.vertex_at(position);
    let new = Vertex::from_index((old.index() + 4) % 12);
    let prev = store.vertex_at(Position::new(0, 4));
    let next = store.vertex_at(Position::new(0, 6));

    let changes = DiffBuilder::single(&store, position, new);
    engine.stage(&changes).unwrap();

    let (in_door, _) = store.edge_at(0, 4);
    let (out_door, _) = store.edge_at(0, 5);
    let moved_out = DoorKey::new(new, out_door.door);

    let dirty = engine.dirty();
    assert_eq!(dirty.edges().len(), 4);
    for door in dirty.doors() {
        assert!([in_door, out_door, moved_out].contains(door), "unexpected door {door}");
    }
    for v in dirty.vertices() {
        assert!([prev, old, new, next].contains(v), "unexpected vertex {v}");
    }
    // a clean solved walk only gets worse
    assert!(engine.score_delta_value() >= 0.0);
    engine.discard();
    assert!(engine.dirty().is_empty());
}

#[test]
fn discard_twice_is_noop() {
    let instance = seeded_instance(3, 8, 3, 30);
    let mut rng = StdRng::seed_from_u64(9);
    let store = instance.scrambled_store(&mut rng);
    let mut engine = ScoreEngine::from_store(&store, ScoreConfig::default());
    let before = counters(&engine);

    let changes = DiffBuilder::single(&store, Position::new(1, 3), Vertex(5));
    engine.stage(&changes).unwrap();
    engine.discard();
    engine.discard();

    assert_eq!(counters(&engine), before);
    engine.verify(&store).unwrap();
    assert_eq!(engine.commit(&store), Err(ScoreError::NothingStaged));
}

#[test]
fn negated_changeset_restores_counters() {
    let instance = seeded_instance(5, 8, 2, 25);
    let mut rng = StdRng::seed_from_u64(5);
    let mut store = instance.scrambled_store(&mut rng);
    let mut engine = ScoreEngine::from_store(&store, ScoreConfig::default());
    let before = counters(&engine);
    let score_before = engine.score();

    let position = Position::new(0, 7);
    let old = store.vertex_at(position);
    let new = Vertex::from_index((old.index() + 1) % 8);
    let forward = DiffBuilder::single(&store, position, new);
    engine.stage(&forward).unwrap();
    store.set_hypothesis(position, new).unwrap();
    engine.commit(&store).unwrap();

    engine.stage(&forward.negated()).unwrap();
    store.set_hypothesis(position, old).unwrap();
    engine.commit(&store).unwrap();

    assert_eq!(counters(&engine), before);
    assert_eq!(engine.score(), score_before);
    engine.verify(&store).unwrap();
}

#[test]
fn override_truth_scores_zero() {
    let instance = seeded_override_instance(21, 8, 2, 40, 20);
    assert!(instance.has_overrides());
    let engine = ScoreEngine::from_store(&instance.solved_store(), ScoreConfig::default());
    assert!(engine.score().is_zero());

    // recoded stores count misses per trace, summing to the score term
    let layered = seeded_layered_instance(Mirror, 21, 6, 2, 60, 25);
    let engine = ScoreEngine::from_store(&layered.solved_store(), ScoreConfig::default());
    assert!(engine.score().is_zero());
    let mut rng = StdRng::seed_from_u64(21);
    let store = layered.recoded_store(&mut rng);
    let engine = ScoreEngine::from_store(&store, ScoreConfig::default());
    assert_eq!(engine.score().conflict, 0);
    let misses: i32 = (0..store.trace_count()).map(|t| engine.trace_misses(t)).sum();
    assert_eq!(i64::from(misses), engine.score().mismatch);
}

#[test]
fn empty_changeset_commits_nothing() {
    let instance = four_vertex_instance();
    let store = instance.solved_store();
    let mut engine = ScoreEngine::from_store(&store, ScoreConfig::default());
    engine.stage(&ChangeSet::new()).unwrap();
    assert!(engine.score_delta().is_zero());
    let delta = engine.commit(&store).unwrap();
    assert!(delta.is_zero());
    assert!(engine.score().is_zero());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_incremental_matches_rescan(seed in any::<u64>(), group in 1usize..4) {
        let instance = seeded_instance(seed, 12, 3, 30);
        let mut rng = StdRng::seed_from_u64(seed ^ 0x5eed);
        let mut store = instance.scrambled_store(&mut rng);
        let pool = CandidatePool::new(store.vertex_count());
        let mut engine = ScoreEngine::from_store(&store, ScoreConfig::default());

        for _ in 0..200 {
            let moves: Vec<Reassignment> = (0..group)
                .map(|_| {
                    let position = random_position(&store, &mut rng);
                    let label = store.required_label(position);
                    Reassignment::new(position, pool.draw(label, &mut rng))
                })
                .collect();
            let changes = DiffBuilder::build(&store, &moves);
            engine.stage(&changes).unwrap();
            let predicted = engine.score() + engine.score_delta();

            if rng.gen_bool(0.5) {
                store.apply(&moves);
                engine.commit(&store).unwrap();
                prop_assert_eq!(engine.score(), predicted);
            } else {
                engine.discard();
            }

            engine.check_door_totals().unwrap();
            let rescan = ScoreEngine::from_store(&store, ScoreConfig::default());
            prop_assert_eq!(engine.score(), rescan.score());
            prop_assert_eq!(engine.bad_positions(), rescan.bad_positions());
        }
        engine.verify(&store).unwrap();
    }

    #[test]
    fn prop_override_moves_match_rescan(seed in any::<u64>(), group in 1usize..3) {
        let instance = seeded_layered_instance(Mirror, seed, 6, 2, 30, 20);
        let mut rng = StdRng::seed_from_u64(seed ^ 0x1abe1);
        let mut store = instance.scrambled_store(&mut rng);
        let pool = CandidatePool::new(store.vertex_count());
        let mut engine = ScoreEngine::from_store(&store, ScoreConfig::default());

        for _ in 0..150 {
            let recode = rng.gen_bool(0.3);
            let (changes, moves, flip) = if recode {
                let (t, s) = store.door_step(rng.gen_range(0..store.movable_positions()));
                let (door, _) = store.edge_at(t, s);
                let flip = Recode::new(door, 1 - store.code(door));
                (DiffBuilder::recode(&store, flip), Vec::new(), Some(flip))
            } else {
                let moves: Vec<Reassignment> = (0..group)
                    .map(|_| {
                        let position = random_position(&store, &mut rng);
                        let label = store.required_label(position);
                        Reassignment::new(position, pool.draw(label, &mut rng))
                    })
                    .collect();
                (DiffBuilder::build(&store, &moves), moves, None)
            };
            // recodes never move votes
            prop_assert!(!recode || changes.len() == 0);
            engine.stage(&changes).unwrap();
            let predicted = engine.score() + engine.score_delta();

            if rng.gen_bool(0.5) {
                store.apply(&moves);
                if let Some(flip) = flip {
                    store.recode(flip);
                }
                engine.commit(&store).unwrap();
                prop_assert_eq!(engine.score(), predicted);
            } else {
                engine.discard();
            }

            let rescan = ScoreEngine::from_store(&store, ScoreConfig::default());
            prop_assert_eq!(engine.score(), rescan.score());
            prop_assert_eq!(engine.bad_positions(), rescan.bad_positions());
        }
        engine.verify(&store).unwrap();
    }
}
