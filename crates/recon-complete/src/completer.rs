//! Majority vote plus leftover-parent matching

use crate::table::DoorTable;
use recon_score::ScoreEngine;
use recon_trace::{Door, DoorKey, Vertex};
use serde::Serialize;

/// A completed table and how much of it was guessed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    /// One destination per base door
    pub table: DoorTable,
    /// Doors that had at least one vote
    pub determined: usize,
    /// Fills that were not forced: several leftover parents, or none
    pub ambiguous: usize,
}

/// Turns committed vote counters into a fully defined door table
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphCompleter;

impl GraphCompleter {
    /// Complete the graph from an engine's committed counters
    ///
    /// 1. each door takes its most-voted destination (ties → smallest vertex)
    /// 2. each vertex matches its remaining incoming doors against its
    ///    unvoted outgoing doors; unmatched doors become self-loops
    #[must_use]
    pub fn complete(engine: &ScoreEngine) -> Completion {
        let n = engine.vertex_count();
        let keys = || (0..n).flat_map(|v| Door::all().map(move |d| DoorKey::new(Vertex::from_index(v), d)));

        let majority: Vec<Option<Vertex>> = keys()
            .map(|door| {
                let votes = engine.door_votes(door);
                let (best, &count) = votes
                    .iter()
                    .enumerate()
                    .max_by(|(ia, a), (ib, b)| a.cmp(b).then(ib.cmp(ia)))?;
                (count > 0).then(|| Vertex::from_index(best))
            })
            .collect();
        Self::fill(n, &majority)
    }

    /// Leftover matching over a partial table in `(vertex, door)` order
    #[must_use]
    pub fn fill(vertex_count: usize, partial: &[Option<Vertex>]) -> Completion {
        let mut parents: Vec<Vec<Vertex>> = vec![Vec::new(); vertex_count];
        for (index, target) in partial.iter().enumerate() {
            if let Some(to) = target {
                parents[to.index()].push(DoorKey::from_index(index).vertex);
            }
        }

        let mut table = DoorTable::self_loops(vertex_count);
        let mut determined = 0;
        let mut ambiguous = 0;
        for v in 0..vertex_count {
            let vertex = Vertex::from_index(v);
            let leftovers = &mut parents[v];
            for door in Door::all() {
                let key = DoorKey::new(vertex, door);
                if let Some(to) = partial[key.index()] {
                    table.set(key, to);
                    determined += 1;
                    if let Some(i) = leftovers.iter().position(|&p| p == to) {
                        leftovers.remove(i);
                    }
                }
            }
            for door in Door::all() {
                let key = DoorKey::new(vertex, door);
                if partial[key.index()].is_some() {
                    continue;
                }
                if leftovers.len() != 1 {
                    ambiguous += 1;
                }
                table.set(key, leftovers.pop().unwrap_or(vertex));
            }
        }

        tracing::debug!(determined, ambiguous, "graph completed");
        Completion {
            table,
            determined,
            ambiguous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_trace::DOOR_COUNT;

    #[test]
    fn leftover_parents_fill_open_doors() {
        // 0 -d0-> 1 is the only known edge; 1 owes 0 a return door
        let mut partial = vec![None; 2 * DOOR_COUNT];
        partial[DoorKey::new(Vertex(0), Door(0)).index()] = Some(Vertex(1));
        let completion = GraphCompleter::fill(2, &partial);

        assert_eq!(completion.determined, 1);
        assert_eq!(completion.table.target(DoorKey::new(Vertex(0), Door(0))), Vertex(1));
        // door 0 of vertex 1 is the forced return
        assert_eq!(completion.table.target(DoorKey::new(Vertex(1), Door(0))), Vertex(0));
        assert_eq!(completion.table.target(DoorKey::new(Vertex(1), Door(1))), Vertex(1));
        // 5 self-loops on vertex 0, 5 on vertex 1
        assert_eq!(completion.ambiguous, 10);
    }

    #[test]
    fn own_edges_cancel_matching_parents() {
        // 0 <-> 1 through door 0 both ways; nothing left over
        let mut partial = vec![None; 2 * DOOR_COUNT];
        partial[DoorKey::new(Vertex(0), Door(0)).index()] = Some(Vertex(1));
        partial[DoorKey::new(Vertex(1), Door(0)).index()] = Some(Vertex(0));
        let completion = GraphCompleter::fill(2, &partial);
        assert_eq!(completion.table.target(DoorKey::new(Vertex(1), Door(3))), Vertex(1));
        assert_eq!(completion.determined, 2);
    }
}
