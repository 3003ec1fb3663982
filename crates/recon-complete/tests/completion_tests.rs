use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use recon_complete::{replay, replay_table, DoorTable, GraphCompleter, LayeredTable, Mirror, Triad};
use recon_score::{ScoreConfig, ScoreEngine};
use recon_test_utils::{seeded_instance, seeded_layered_instance, seeded_override_instance};
use recon_trace::{Door, DoorKey, Trace, Vertex, DOOR_COUNT};

#[test]
fn solved_hypothesis_completes_to_a_consistent_table() {
    let instance = seeded_instance(21, 16, 3, 96);
    let store = instance.solved_store();
    let engine = ScoreEngine::from_store(&store, ScoreConfig::default());
    assert!(engine.score().is_zero());

    let completion = GraphCompleter::complete(&engine);
    for door in (0..16 * DOOR_COUNT).map(DoorKey::from_index) {
        if engine.door_total(door) > 0 {
            assert_eq!(completion.table.target(door), instance.graph.target(door));
        }
    }

    let report = replay(&LayeredTable::plain(completion.table), store.traces()).unwrap();
    assert_eq!(report.steps, 3 * 96);
    assert!(report.is_consistent());
}

#[test]
fn wrong_table_is_caught_by_replay() {
    let instance = seeded_instance(22, 8, 2, 40);
    let table = DoorTable::self_loops(8);
    let report = replay(&LayeredTable::plain(table), &instance.traces).unwrap();
    assert!(!report.is_consistent());
}

#[test]
fn override_truth_completes_to_a_consistent_table() {
    let instance = seeded_override_instance(31, 8, 2, 60, 20);
    assert!(instance.has_overrides());
    let store = instance.solved_store();
    let engine = ScoreEngine::from_store(&store, ScoreConfig::default());
    assert!(engine.score().is_zero());

    let completion = GraphCompleter::complete(&engine);
    let report = replay(&LayeredTable::plain(completion.table), store.traces()).unwrap();
    assert!(report.is_consistent());
}

#[test]
fn mirror_truth_replays_through_hypothesis_codes() {
    let instance = seeded_layered_instance(Mirror, 32, 5, 2, 60, 25);
    let store = instance.solved_store();
    let engine = ScoreEngine::from_store(&store, ScoreConfig::default());
    assert!(engine.score().is_zero());

    let completion = GraphCompleter::complete(&engine);
    let layered = LayeredTable::new(completion.table, store.codes().to_vec(), Mirror).unwrap();
    assert!(replay(&layered, store.traces()).unwrap().is_consistent());
    let full = layered.expand();
    assert_eq!(full.vertex_count(), 10);
    assert!(replay_table(&full, 5, store.traces()).unwrap().is_consistent());
}

/// Walk the expanded table and record what a visitor would observe
fn observe(full: &DoorTable, base: usize, doors: Vec<Door>) -> Trace {
    let mut state = Vertex(0);
    let mut labels = vec![Vertex::from_index(0).class()];
    for &door in &doors {
        state = full.target(DoorKey::new(state, door));
        labels.push(Vertex::from_index(state.index() % base).class());
    }
    Trace::new(doors, labels).unwrap()
}

fn random_layered_walks(seed: u64, base: usize, codes: u8) -> (DoorTable, Vec<u8>, Vec<Vec<Door>>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let targets = (0..base * DOOR_COUNT)
        .map(|_| Vertex::from_index(rng.gen_range(0..base)))
        .collect();
    let table = DoorTable::from_targets(targets).unwrap();
    let code_list = (0..base * DOOR_COUNT).map(|_| rng.gen_range(0..codes)).collect();
    let walks = (0..3)
        .map(|_| (0..50).map(|_| Door::from_index(rng.gen_range(0..DOOR_COUNT))).collect())
        .collect();
    (table, code_list, walks)
}

proptest! {
    #[test]
    fn prop_triad_replay_matches_expanded_walk(seed in any::<u64>(), base in 1usize..8) {
        let (table, codes, walks) = random_layered_walks(seed, base, 6);
        let layered = LayeredTable::new(table, codes, Triad).unwrap();
        let full = layered.expand();
        prop_assert_eq!(full.vertex_count(), base * 3);

        let traces: Vec<Trace> = walks.into_iter().map(|d| observe(&full, base, d)).collect();
        let layered_report = replay(&layered, &traces).unwrap();
        let flat_report = replay_table(&full, base, &traces).unwrap();
        prop_assert!(layered_report.is_consistent());
        prop_assert_eq!(layered_report, flat_report);
    }

    #[test]
    fn prop_mirror_replay_matches_expanded_walk(seed in any::<u64>(), base in 1usize..8) {
        let (table, codes, walks) = random_layered_walks(seed, base, 2);
        let layered = LayeredTable::new(table, codes, Mirror).unwrap();
        let full = layered.expand();
        let traces: Vec<Trace> = walks.into_iter().map(|d| observe(&full, base, d)).collect();
        prop_assert!(replay(&layered, &traces).unwrap().is_consistent());
        prop_assert!(replay_table(&full, base, &traces).unwrap().is_consistent());
    }
}
