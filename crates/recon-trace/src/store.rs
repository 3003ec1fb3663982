//! Trace store: immutable observations plus the mutable hypothesis
//!
//! The hypothesis has two parts: one vertex per trace step, and one
//! orientation code per `(vertex, door)` slot of the base graph. With
//! [`Plain`] every code is 0 and only the vertices move.

use crate::error::StoreError;
use crate::orientation::{label_misses, Orientation, Plain};
use crate::pool::CandidatePool;
use crate::trace::Trace;
use crate::types::{DoorKey, Label, Position, Vertex, DOOR_COUNT};
use rand::Rng;

/// Every walk starts in this vertex; step 0 is never reassigned.
pub const START_VERTEX: Vertex = Vertex(0);

/// A proposed new hypothesis for one trace step
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Reassignment {
    /// Step to move
    pub position: Position,
    /// Its new vertex
    pub vertex: Vertex,
}

impl Reassignment {
    /// Move `position` to `vertex`
    #[inline]
    #[must_use]
    pub const fn new(position: Position, vertex: Vertex) -> Self {
        Self { position, vertex }
    }
}

/// A proposed new orientation code for one base door
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Recode {
    /// Door whose code changes
    pub door: DoorKey,
    /// Its new code
    pub code: u8,
}

impl Recode {
    /// Give `door` the code `code`
    #[inline]
    #[must_use]
    pub const fn new(door: DoorKey, code: u8) -> Self {
        Self { door, code }
    }
}

/// Saved copy of the whole hypothesis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HypothesisSnapshot {
    vertices: Vec<Vec<Vertex>>,
    codes: Vec<u8>,
}

/// Observed traces and the current hypothesis
///
/// Traces are fixed after construction. Hypotheses change only through
/// [`TraceStore::apply`], [`TraceStore::recode`], the setters and
/// [`TraceStore::restore`]; the scoring engine is told about every change
/// through the diff protocol.
#[derive(Debug, Clone)]
pub struct TraceStore<O = Plain> {
    vertex_count: usize,
    traces: Vec<Trace>,
    /// First global door-step index of each trace
    offsets: Vec<usize>,
    hypotheses: Vec<Vec<Vertex>>,
    codes: Vec<u8>,
    orientation: O,
}

impl TraceStore<Plain> {
    /// Single-layer store with every hypothesis at [`START_VERTEX`]
    ///
    /// # Errors
    /// Returns [`StoreError::VertexCount`] if `vertex_count` is zero or does
    /// not fit the vertex space.
    pub fn new(vertex_count: usize, traces: Vec<Trace>) -> Result<Self, StoreError> {
        Self::with_orientation(vertex_count, traces, Plain)
    }
}

impl<O: Orientation> TraceStore<O> {
    /// Store over a layered graph of `vertex_count` base vertices
    ///
    /// Every hypothesis starts at [`START_VERTEX`] and every code at 0.
    ///
    /// # Errors
    /// Returns [`StoreError::VertexCount`] if `vertex_count` is zero or does
    /// not fit the vertex space.
    pub fn with_orientation(vertex_count: usize, traces: Vec<Trace>, orientation: O) -> Result<Self, StoreError> {
        if vertex_count == 0 || vertex_count > usize::from(u16::MAX) {
            return Err(StoreError::VertexCount(vertex_count));
        }
        let hypotheses = traces
            .iter()
            .map(|t| vec![START_VERTEX; t.len() + 1])
            .collect();
        let offsets = traces
            .iter()
            .scan(0, |next, t| {
                let start = *next;
                *next += t.len();
                Some(start)
            })
            .collect();
        Ok(Self {
            vertex_count,
            traces,
            offsets,
            hypotheses,
            codes: vec![0; vertex_count * DOOR_COUNT],
            orientation,
        })
    }

    /// Base vertices, not counting layers
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Layer permutation family of the codes
    #[inline]
    #[must_use]
    pub fn orientation(&self) -> &O {
        &self.orientation
    }

    /// Every trace in input order
    #[inline]
    #[must_use]
    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    /// Trace `index`
    #[inline]
    #[must_use]
    pub fn trace(&self, index: usize) -> &Trace {
        &self.traces[index]
    }

    /// Number of traces
    #[inline]
    #[must_use]
    pub fn trace_count(&self) -> usize {
        self.traces.len()
    }

    /// Number of reassignable steps across all traces
    #[must_use]
    pub fn movable_positions(&self) -> usize {
        self.traces.iter().map(Trace::len).sum()
    }

    /// Door step number `index` in trace-major order as `(trace, step)`
    ///
    /// Every door step is hit by exactly one `index < movable_positions()`,
    /// so a uniform index gives a uniform step whatever the trace lengths.
    #[must_use]
    pub fn door_step(&self, index: usize) -> (usize, usize) {
        debug_assert!(index < self.movable_positions());
        let trace = self.offsets.partition_point(|&start| start <= index) - 1;
        (trace, index - self.offsets[trace])
    }

    /// Hypothesis array of one trace
    #[inline]
    #[must_use]
    pub fn hypotheses(&self, trace: usize) -> &[Vertex] {
        &self.hypotheses[trace]
    }

    /// Hypothesized vertex at `position`
    #[inline]
    #[must_use]
    pub fn vertex_at(&self, position: Position) -> Vertex {
        self.hypotheses[position.trace][position.step]
    }

    /// Orientation code of a base door
    #[inline]
    #[must_use]
    pub fn code(&self, door: DoorKey) -> u8 {
        self.codes[door.index()]
    }

    /// Codes in `(vertex, door)` order
    #[inline]
    #[must_use]
    pub fn codes(&self) -> &[u8] {
        &self.codes
    }

    /// Observed label a hypothesis at `position` must match, if bound
    #[inline]
    #[must_use]
    pub fn required_label(&self, position: Position) -> Option<Label> {
        let trace = &self.traces[position.trace];
        trace
            .is_bound(position.step)
            .then(|| trace.label(position.step))
    }

    /// Edge hypothesized by door step `step` of `trace`
    #[inline]
    #[must_use]
    pub fn edge_at(&self, trace: usize, step: usize) -> (DoorKey, Vertex) {
        let hyp = &self.hypotheses[trace];
        let door = self.traces[trace].door(step);
        (DoorKey::new(hyp[step], door), hyp[step + 1])
    }

    /// Iterate every hypothesized edge as `(trace, step, door key, destination)`
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, DoorKey, Vertex)> + '_ {
        self.traces.iter().enumerate().flat_map(move |(t, trace)| {
            (0..trace.len()).map(move |s| {
                let (key, to) = self.edge_at(t, s);
                (t, s, key, to)
            })
        })
    }

    /// Replay `trace` through the current hypothesis
    ///
    /// Calls `on_miss(step)` for each arrival whose label disagrees with the
    /// observation and returns the count.
    pub fn label_misses(&self, trace: usize, on_miss: impl FnMut(usize)) -> usize {
        let hyp = &self.hypotheses[trace];
        label_misses(
            &self.orientation,
            self.vertex_count,
            &self.traces[trace],
            |step| hyp[step],
            |door| self.codes[door.index()],
            on_miss,
        )
    }

    /// Fill every movable step with a random class-consistent vertex and,
    /// for layered graphs, every door with a random code
    pub fn randomize<R: Rng + ?Sized>(&mut self, pool: &CandidatePool, rng: &mut R) {
        for t in 0..self.traces.len() {
            self.randomize_span(t, 1, self.traces[t].len(), pool, rng);
        }
        self.randomize_codes(rng);
    }

    /// Draw every door code uniformly; a no-op for single-code orientations
    pub fn randomize_codes<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let codes = self.orientation.codes();
        if codes <= 1 {
            return;
        }
        for code in &mut self.codes {
            *code = rng.gen_range(0..codes) as u8;
        }
    }

    /// Redraw hypotheses for steps `from..=to` of one trace
    ///
    /// Step 0 is skipped and `to` is clamped to the trace length.
    pub fn randomize_span<R: Rng + ?Sized>(
        &mut self,
        trace: usize,
        from: usize,
        to: usize,
        pool: &CandidatePool,
        rng: &mut R,
    ) {
        let last = to.min(self.traces[trace].len());
        for step in from.max(1)..=last {
            let label = self.required_label(Position::new(trace, step));
            self.hypotheses[trace][step] = pool.draw(label, rng);
        }
    }

    /// Replace one hypothesis
    ///
    /// # Errors
    /// Returns an error for out-of-range vertices or positions.
    pub fn set_hypothesis(&mut self, position: Position, vertex: Vertex) -> Result<(), StoreError> {
        self.check(position, vertex)?;
        self.hypotheses[position.trace][position.step] = vertex;
        Ok(())
    }

    /// Replace a whole hypothesis array
    ///
    /// # Errors
    /// Returns an error if the length or any vertex is out of range.
    pub fn set_trace_hypotheses(&mut self, trace: usize, vertices: Vec<Vertex>) -> Result<(), StoreError> {
        let expected = self
            .traces
            .get(trace)
            .ok_or(StoreError::UnknownTrace(trace))?
            .len()
            + 1;
        if vertices.len() != expected {
            return Err(StoreError::HypothesisLength {
                trace,
                expected,
                found: vertices.len(),
            });
        }
        for (step, &vertex) in vertices.iter().enumerate() {
            self.check(Position::new(trace, step), vertex)?;
        }
        self.hypotheses[trace] = vertices;
        Ok(())
    }

    /// Replace one door code
    ///
    /// # Errors
    /// Returns [`StoreError::CodeOutOfRange`] for an unknown door or a code
    /// the orientation lacks.
    pub fn set_code(&mut self, door: DoorKey, code: u8) -> Result<(), StoreError> {
        if door.vertex.index() >= self.vertex_count || usize::from(code) >= self.orientation.codes() {
            return Err(StoreError::CodeOutOfRange { door, code });
        }
        self.codes[door.index()] = code;
        Ok(())
    }

    /// Apply a committed move
    ///
    /// Callers pass reassignments already validated by the move generator;
    /// positions come from the store itself.
    pub fn apply(&mut self, reassignments: &[Reassignment]) {
        for r in reassignments {
            debug_assert!(r.vertex.index() < self.vertex_count);
            self.hypotheses[r.position.trace][r.position.step] = r.vertex;
        }
    }

    /// Apply a committed code change
    pub fn recode(&mut self, recode: Recode) {
        debug_assert!(usize::from(recode.code) < self.orientation.codes());
        self.codes[recode.door.index()] = recode.code;
    }

    /// Copy of the hypotheses and codes
    #[must_use]
    pub fn snapshot(&self) -> HypothesisSnapshot {
        HypothesisSnapshot {
            vertices: self.hypotheses.clone(),
            codes: self.codes.clone(),
        }
    }

    /// Restore hypotheses from a snapshot taken on this store
    pub fn restore(&mut self, snapshot: &HypothesisSnapshot) {
        debug_assert_eq!(snapshot.vertices.len(), self.hypotheses.len());
        self.hypotheses.clone_from(&snapshot.vertices);
        self.codes.clone_from(&snapshot.codes);
    }

    fn check(&self, position: Position, vertex: Vertex) -> Result<(), StoreError> {
        let trace = self
            .traces
            .get(position.trace)
            .ok_or(StoreError::UnknownTrace(position.trace))?;
        if position.step > trace.len() || vertex.index() >= self.vertex_count {
            return Err(StoreError::VertexOutOfRange { position, vertex });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orientation::Mirror;
    use crate::types::{Door, Label};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn store() -> TraceStore {
        let trace = Trace::new(
            vec![Door(0), Door(1), Door(2)],
            vec![Label(0), Label(1), Label(2), Label(3)],
        )
        .unwrap();
        TraceStore::new(8, vec![trace]).unwrap()
    }

    #[test]
    fn new_store_starts_every_step_at_start_vertex() {
        let store = store();
        assert_eq!(store.hypotheses(0), &[START_VERTEX; 4]);
        assert_eq!(store.movable_positions(), 3);
        assert!(store.codes().iter().all(|&c| c == 0));
    }

    #[test]
    fn randomize_keeps_start_and_matches_classes() {
        let mut store = store();
        let pool = CandidatePool::new(8);
        store.randomize(&pool, &mut StdRng::seed_from_u64(3));
        let hyp = store.hypotheses(0);
        assert_eq!(hyp[0], START_VERTEX);
        for step in 1..hyp.len() {
            assert_eq!(hyp[step].class(), store.trace(0).label(step));
        }
        assert!(store.codes().iter().all(|&c| c == 0));
    }

    #[test]
    fn apply_and_restore() {
        let mut store = store();
        let snap = store.snapshot();
        store.apply(&[Reassignment::new(Position::new(0, 2), Vertex(6))]);
        assert_eq!(store.vertex_at(Position::new(0, 2)), Vertex(6));
        store.restore(&snap);
        assert_eq!(store.vertex_at(Position::new(0, 2)), START_VERTEX);
    }

    #[test]
    fn set_hypothesis_rejects_out_of_range() {
        let mut store = store();
        let err = store.set_hypothesis(Position::new(0, 1), Vertex(8)).unwrap_err();
        assert!(matches!(err, StoreError::VertexOutOfRange { .. }));
        assert!(store.set_trace_hypotheses(0, vec![Vertex(0); 3]).is_err());
    }

    #[test]
    fn edges_follow_hypotheses() {
        let mut store = store();
        store
            .set_trace_hypotheses(0, vec![Vertex(0), Vertex(1), Vertex(2), Vertex(3)])
            .unwrap();
        let edges: Vec<_> = store.edges().collect();
        assert_eq!(edges.len(), 3);
        assert_eq!(edges[1], (0, 1, DoorKey::new(Vertex(1), Door(1)), Vertex(2)));
    }

    #[test]
    fn door_steps_cover_uneven_and_empty_traces() {
        let doors = |n: usize| vec![Door(0); n];
        let labels = |n: usize| vec![Label(0); n + 1];
        let traces = vec![
            Trace::new(doors(0), labels(0)).unwrap(),
            Trace::new(doors(2), labels(2)).unwrap(),
            Trace::new(doors(0), labels(0)).unwrap(),
            Trace::new(doors(3), labels(3)).unwrap(),
        ];
        let store = TraceStore::new(4, traces).unwrap();
        let steps: Vec<_> = (0..store.movable_positions()).map(|i| store.door_step(i)).collect();
        assert_eq!(steps, vec![(1, 0), (1, 1), (3, 0), (3, 1), (3, 2)]);
    }

    #[test]
    fn codes_are_layered_hypothesis_state() {
        let trace = Trace::new(vec![Door(0)], vec![Label(0), Label(1)]).unwrap();
        let mut store = TraceStore::with_orientation(2, vec![trace], Mirror).unwrap();
        let door = DoorKey::new(Vertex(0), Door(0));
        let snap = store.snapshot();

        store.set_code(door, 1).unwrap();
        assert_eq!(store.code(door), 1);
        assert!(matches!(store.set_code(door, 2), Err(StoreError::CodeOutOfRange { code: 2, .. })));

        store.restore(&snap);
        assert_eq!(store.code(door), 0);
        store.recode(Recode::new(door, 1));
        assert_eq!(store.codes().iter().filter(|&&c| c == 1).count(), 1);
    }

    #[test]
    fn replay_counts_misses_after_override() {
        let trace = Trace::with_overrides(
            vec![Door(2), Door(2)],
            vec![Label(0), Label(1), Label(3)],
            vec![Some(Label(3)), None],
        )
        .unwrap();
        let mut store = TraceStore::new(4, vec![trace]).unwrap();
        // 0 -> 1 -> 0 sees the 3 written on vertex 0
        store
            .set_trace_hypotheses(0, vec![Vertex(0), Vertex(1), Vertex(0)])
            .unwrap();
        assert_eq!(store.label_misses(0, |_| {}), 0);

        // vertex 3 has class 3 too but was never marked; still consistent
        store.set_hypothesis(Position::new(0, 2), Vertex(3)).unwrap();
        assert_eq!(store.label_misses(0, |_| {}), 0);

        // vertex 2 shows its class 2
        store.set_hypothesis(Position::new(0, 2), Vertex(2)).unwrap();
        let mut missed = Vec::new();
        assert_eq!(store.label_misses(0, |s| missed.push(s)), 1);
        assert_eq!(missed, vec![2]);
    }
}
