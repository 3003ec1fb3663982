//! Hypothesis moves → changesets

use crate::changeset::{ChangeSet, Edge};
use recon_trace::{label_misses, DoorKey, Orientation, Position, Reassignment, Recode, TraceStore, Vertex};
use smallvec::SmallVec;

/// Translates hypothesis moves into the votes and mismatches they change
///
/// A step's hypothesis appears in at most two edges: as destination of
/// door step `step - 1` and as source of door step `step`. Only edges whose
/// endpoints actually change produce entries.
///
/// Label mismatches are position-local in traces without overrides. A trace
/// with overrides is replayed before and after the move.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffBuilder;

impl DiffBuilder {
    /// Changeset for applying `reassignments` to the current `store`
    ///
    /// When a position is listed more than once the last entry wins.
    #[must_use]
    pub fn build<O: Orientation>(store: &TraceStore<O>, reassignments: &[Reassignment]) -> ChangeSet {
        let mut targets: SmallVec<[Reassignment; 8]> = reassignments.iter().rev().copied().collect();
        targets.sort_by_key(|r| r.position);
        targets.dedup_by_key(|r| r.position);

        let mut affected: SmallVec<[(usize, usize); 16]> = SmallVec::new();
        for r in &targets {
            let Position { trace, step } = r.position;
            if step > 0 {
                affected.push((trace, step - 1));
            }
            if step < store.trace(trace).len() {
                affected.push((trace, step));
            }
        }
        affected.sort_unstable();
        affected.dedup();

        let next = |trace: usize, step: usize| -> Vertex {
            let position = Position::new(trace, step);
            targets
                .binary_search_by_key(&position, |r| r.position)
                .map_or_else(|_| store.vertex_at(position), |i| targets[i].vertex)
        };

        let mut changes = ChangeSet::new();
        for (trace, step) in affected {
            let (old_door, old_to) = store.edge_at(trace, step);
            let door = DoorKey::new(next(trace, step), store.trace(trace).door(step));
            let to = next(trace, step + 1);
            if door != old_door || to != old_to {
                changes.redirect(Edge::new(old_door, old_to), Edge::new(door, to));
            }
        }

        let mut rest = &targets[..];
        while let Some(first) = rest.first() {
            let t = first.position.trace;
            let split = rest.iter().position(|r| r.position.trace != t).unwrap_or(rest.len());
            let (group, tail) = rest.split_at(split);
            rest = tail;

            let trace = store.trace(t);
            let delta = if trace.first_override().is_some() {
                let after = label_misses(
                    store.orientation(),
                    store.vertex_count(),
                    trace,
                    |step| next(t, step),
                    |door| store.code(door),
                    |_| {},
                );
                after as i64 - store.label_misses(t, |_| {}) as i64
            } else {
                group
                    .iter()
                    .filter(|r| r.position.step > 0)
                    .map(|r| {
                        let seen = trace.label(r.position.step);
                        let old = store.vertex_at(r.position);
                        i64::from(r.vertex.class() != seen) - i64::from(old.class() != seen)
                    })
                    .sum()
            };
            changes.push_misses(t, delta as i32);
        }
        changes
    }

    /// Changeset for moving a single position
    #[inline]
    #[must_use]
    pub fn single<O: Orientation>(store: &TraceStore<O>, position: Position, vertex: Vertex) -> ChangeSet {
        Self::build(store, &[Reassignment::new(position, vertex)])
    }

    /// Changeset for giving one base door a new orientation code
    ///
    /// Codes only steer the layer a walker is in, so votes never change;
    /// only traces with overrides can see a different label.
    #[must_use]
    pub fn recode<O: Orientation>(store: &TraceStore<O>, recode: Recode) -> ChangeSet {
        let mut changes = ChangeSet::new();
        if store.code(recode.door) == recode.code {
            return changes;
        }
        let code_of = |door: DoorKey| {
            if door == recode.door {
                recode.code
            } else {
                store.code(door)
            }
        };
        for (t, trace) in store.traces().iter().enumerate() {
            if trace.first_override().is_none() {
                continue;
            }
            let hyp = store.hypotheses(t);
            let after = label_misses(
                store.orientation(),
                store.vertex_count(),
                trace,
                |step| hyp[step],
                code_of,
                |_| {},
            );
            let before = store.label_misses(t, |_| {});
            changes.push_misses(t, (after as i64 - before as i64) as i32);
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use recon_trace::{parse_input, Door, Label, Mirror, Trace};

    fn store() -> TraceStore {
        let trace = Trace::new(vec![Door(2), Door(4)], vec![Label(0), Label(1), Label(2)]).unwrap();
        let mut store = TraceStore::new(3, vec![trace]).unwrap();
        store
            .set_trace_hypotheses(0, vec![Vertex(0), Vertex(1), Vertex(2)])
            .unwrap();
        store
    }

    #[test]
    fn interior_step_touches_both_edges() {
        let store = store();
        let cs = DiffBuilder::single(&store, Position::new(0, 1), Vertex(2));
        assert_eq!(cs.len(), 4);
        assert!(cs.is_balanced());
        let removed: Vec<String> = cs
            .entries()
            .iter()
            .filter(|e| e.delta < 0)
            .map(|e| e.edge.to_string())
            .collect();
        assert_eq!(removed, vec!["0/2 -> 1".to_string(), "1/4 -> 2".to_string()]);
    }

    #[test]
    fn final_step_touches_one_edge() {
        let store = store();
        let cs = DiffBuilder::single(&store, Position::new(0, 2), Vertex(0));
        assert_eq!(cs.len(), 2);
    }

    #[test]
    fn unchanged_vertex_yields_empty_changeset() {
        let store = store();
        assert!(DiffBuilder::single(&store, Position::new(0, 1), Vertex(1)).is_empty());
    }

    #[test]
    fn adjacent_moves_share_the_middle_edge() {
        let store = store();
        let cs = DiffBuilder::build(
            &store,
            &[
                Reassignment::new(Position::new(0, 1), Vertex(0)),
                Reassignment::new(Position::new(0, 2), Vertex(0)),
            ],
        );
        // edges 0 and 1 each change once
        assert_eq!(cs.len(), 4);
        let added: Vec<Edge> = cs.entries().iter().filter(|e| e.delta > 0).map(|e| e.edge).collect();
        assert_eq!(
            added,
            vec![
                Edge::new(DoorKey::new(Vertex(0), Door(2)), Vertex(0)),
                Edge::new(DoorKey::new(Vertex(0), Door(4)), Vertex(0)),
            ]
        );
    }

    #[test]
    fn later_duplicate_wins() {
        let store = store();
        let cs = DiffBuilder::build(
            &store,
            &[
                Reassignment::new(Position::new(0, 2), Vertex(0)),
                Reassignment::new(Position::new(0, 2), Vertex(1)),
            ],
        );
        let added: Vec<Vertex> = cs.entries().iter().filter(|e| e.delta > 0).map(|e| e.edge.to).collect();
        assert_eq!(added, vec![Vertex(1)]);
    }

    #[test]
    fn plain_trace_misses_are_local() {
        let store = store();
        // class 2 lands where label 1 was observed
        let cs = DiffBuilder::single(&store, Position::new(0, 1), Vertex(2));
        assert_eq!(cs.misses().len(), 1);
        assert_eq!(cs.misses()[0].delta, 1);
        // moving the start never touches the label term
        let cs = DiffBuilder::single(&store, Position::new(0, 0), Vertex(1));
        assert!(cs.misses().is_empty());
    }

    #[test]
    fn override_trace_is_replayed() {
        // [2] at vertex 0, then door 0; label 1 is observed on arrival
        let mut store = parse_input("4\n1\n[2]0\n021\n").unwrap().into_store().unwrap();
        store.set_hypothesis(Position::new(0, 1), Vertex(0)).unwrap();
        assert_eq!(store.label_misses(0, |_| {}), 1);

        let cs = DiffBuilder::single(&store, Position::new(0, 1), Vertex(1));
        assert_eq!(cs.misses()[0].trace, 0);
        assert_eq!(cs.misses()[0].delta, -1);
        // class 2 misses as well; only the edge moves
        let cs = DiffBuilder::single(&store, Position::new(0, 1), Vertex(2));
        assert!(cs.misses().is_empty());
        assert_eq!(cs.len(), 2);
        assert!(DiffBuilder::single(&store, Position::new(0, 1), Vertex(0)).is_empty());
    }

    #[test]
    fn recode_changes_only_misses() {
        // 0 -[1]d0-> 1 -d0-> 0 on a mirror: the mark is seen again only if
        // the return door keeps the layer
        let trace = Trace::with_overrides(
            vec![Door(0), Door(0)],
            vec![Label(0), Label(1), Label(1)],
            vec![Some(Label(1)), None],
        )
        .unwrap();
        let mut store = TraceStore::with_orientation(2, vec![trace], Mirror).unwrap();
        store
            .set_trace_hypotheses(0, vec![Vertex(0), Vertex(1), Vertex(0)])
            .unwrap();
        assert_eq!(store.label_misses(0, |_| {}), 0);

        let back = DoorKey::new(Vertex(1), Door(0));
        let cs = DiffBuilder::recode(&store, Recode::new(back, 1));
        assert_eq!(cs.len(), 0);
        assert_eq!(cs.misses()[0].delta, 1);
        assert!(DiffBuilder::recode(&store, Recode::new(back, 0)).is_empty());
    }
}
