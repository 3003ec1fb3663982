//! Re-walking traces through a completed table

use crate::error::CompleteError;
use crate::layered::LayeredTable;
use crate::table::DoorTable;
use recon_trace::{Door, DoorKey, Label, Orientation, Trace, Vertex};
use serde::Serialize;

/// Label agreement between a table and the observations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    /// Door steps walked
    pub steps: usize,
    /// Steps whose arrival label differs from the observed one
    pub mismatches: usize,
}

impl ReplayReport {
    /// No step disagreed
    #[inline]
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.mismatches == 0
    }
}

/// Walk every trace through a layered table from base vertex 0, layer 0
///
/// Each room starts with its base vertex's class as label; overrides
/// rewrite the current room's label (per layer) for the rest of that
/// trace.
///
/// # Errors
/// Returns [`CompleteError::EmptyTable`] for a table without vertices.
pub fn replay<O: Orientation>(table: &LayeredTable<O>, traces: &[Trace]) -> Result<ReplayReport, CompleteError> {
    let n = table.base().vertex_count();
    if n == 0 {
        return Err(CompleteError::EmptyTable);
    }
    let states = n * table.orientation().layers();
    Ok(walk(traces, states, n, |state, door| {
        let (to, layer) = table.step(Vertex::from_index(state % n), state / n, door);
        layer * n + to.index()
    }))
}

/// Walk every trace through an expanded table
///
/// Vertex `u` starts labelled with the class of `u % base_vertices`, the
/// layout [`LayeredTable::expand`] produces.
///
/// # Errors
/// Returns [`CompleteError::EmptyTable`] if either count is zero.
pub fn replay_table(table: &DoorTable, base_vertices: usize, traces: &[Trace]) -> Result<ReplayReport, CompleteError> {
    if table.vertex_count() == 0 || base_vertices == 0 {
        return Err(CompleteError::EmptyTable);
    }
    Ok(walk(traces, table.vertex_count(), base_vertices, |state, door| {
        table.target(DoorKey::new(Vertex::from_index(state), door)).index()
    }))
}

fn walk(traces: &[Trace], states: usize, base: usize, step: impl Fn(usize, Door) -> usize) -> ReplayReport {
    let initial: Vec<Label> = (0..states).map(|s| Vertex::from_index(s % base).class()).collect();
    let mut labels = initial.clone();
    let mut report = ReplayReport::default();

    for trace in traces {
        labels.clone_from(&initial);
        let mut state = 0;
        for (i, &door) in trace.doors().iter().enumerate() {
            if let Some(label) = trace.override_at(i) {
                labels[state] = label;
            }
            state = step(state, door);
            report.steps += 1;
            if labels[state] != trace.label(i + 1) {
                report.mismatches += 1;
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_trace::Mirror;

    #[test]
    fn override_changes_later_arrivals() {
        // single vertex, every door a self-loop
        let table = LayeredTable::plain(DoorTable::self_loops(1));
        let trace = Trace::with_overrides(
            vec![Door(0), Door(1)],
            vec![Label(0), Label(2), Label(2)],
            vec![Some(Label(2)), None],
        )
        .unwrap();
        let report = replay(&table, &[trace]).unwrap();
        assert_eq!(report, ReplayReport { steps: 2, mismatches: 0 });
    }

    #[test]
    fn mirror_layers_keep_separate_labels() {
        // vertex 0 with door 0 swapping layers
        let mut codes = vec![0; 6];
        codes[0] = 1;
        let table = LayeredTable::new(DoorTable::self_loops(1), codes, Mirror).unwrap();
        // rewrite layer 0 to 3, cross to layer 1 (still 0), cross back (3)
        let trace = Trace::with_overrides(
            vec![Door(0), Door(0)],
            vec![Label(0), Label(0), Label(3)],
            vec![Some(Label(3)), None],
        )
        .unwrap();
        let report = replay(&table, std::slice::from_ref(&trace)).unwrap();
        assert!(report.is_consistent());
        let flat = replay_table(&table.expand(), 1, &[trace]).unwrap();
        assert_eq!(flat, report);
    }

    #[test]
    fn empty_table_is_rejected() {
        assert_eq!(
            replay_table(&DoorTable::self_loops(0), 1, &[]),
            Err(CompleteError::EmptyTable)
        );
    }
}
