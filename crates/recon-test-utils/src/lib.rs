//! Testing utilities for the recon workspace
//!
//! Hidden graphs with a known answer, random walks over them, and stores
//! seeded with either the true or a scrambled hypothesis. Layered instances
//! add per-door orientation codes and label overrides.

#![allow(missing_docs)]

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use recon_trace::{
    CandidatePool, Door, DoorKey, Label, Orientation, Plain, Trace, TraceStore, Vertex, DOOR_COUNT, LABEL_COUNT,
    START_VERTEX,
};

/// A fully defined door graph
///
/// Built by pairing door slots at random, so every door `a` leading to `b`
/// has a partner door of `b` leading back to `a`. Degree aggregates of the
/// true graph therefore never exceed [`DOOR_COUNT`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiddenGraph {
    pub targets: Vec<Vertex>,
}

impl HiddenGraph {
    pub fn random<R: Rng + ?Sized>(vertex_count: usize, rng: &mut R) -> Self {
        Self::paired(vertex_count, rng).0
    }

    /// Random graph plus the door pairing it was built from
    fn paired<R: Rng + ?Sized>(vertex_count: usize, rng: &mut R) -> (Self, Vec<DoorKey>) {
        let mut slots: Vec<DoorKey> = (0..vertex_count * DOOR_COUNT).map(DoorKey::from_index).collect();
        slots.shuffle(rng);
        let mut targets = vec![START_VERTEX; slots.len()];
        for pair in slots.chunks_exact(2) {
            targets[pair[0].index()] = pair[1].vertex;
            targets[pair[1].index()] = pair[0].vertex;
        }
        (Self { targets }, slots)
    }

    pub fn vertex_count(&self) -> usize {
        self.targets.len() / DOOR_COUNT
    }

    pub fn target(&self, door: DoorKey) -> Vertex {
        self.targets[door.index()]
    }

    /// Walk `doors` from the start vertex; returns visited vertices
    pub fn walk(&self, doors: &[Door]) -> Vec<Vertex> {
        let mut current = START_VERTEX;
        let mut visited = Vec::with_capacity(doors.len() + 1);
        visited.push(current);
        for &door in doors {
            current = self.target(DoorKey::new(current, door));
            visited.push(current);
        }
        visited
    }
}

/// A generated problem with its known answer
#[derive(Debug, Clone)]
pub struct Instance<O = Plain> {
    pub graph: HiddenGraph,
    pub orientation: O,
    /// True code of every base door, indexed by [`DoorKey::index`]
    pub codes: Vec<u8>,
    pub traces: Vec<Trace>,
    pub truth: Vec<Vec<Vertex>>,
}

impl<O: Orientation> Instance<O> {
    /// Store whose hypotheses are the true walk vertices and door codes
    pub fn solved_store(&self) -> TraceStore<O> {
        let mut store = self.recoded_with(|_| ());
        for (i, &code) in self.codes.iter().enumerate() {
            store
                .set_code(DoorKey::from_index(i), code)
                .expect("true codes are in range");
        }
        store
    }

    /// Store with the true vertices but random door codes
    pub fn recoded_store<R: Rng + ?Sized>(&self, rng: &mut R) -> TraceStore<O> {
        self.recoded_with(|store| store.randomize_codes(rng))
    }

    fn recoded_with(&self, codes: impl FnOnce(&mut TraceStore<O>)) -> TraceStore<O> {
        let mut store = self.empty_store();
        for (t, visited) in self.truth.iter().enumerate() {
            store
                .set_trace_hypotheses(t, visited.clone())
                .expect("truth matches trace shape");
        }
        codes(&mut store);
        store
    }

    /// Store with every hypothesis at the start vertex and every code 0
    pub fn empty_store(&self) -> TraceStore<O> {
        TraceStore::with_orientation(self.graph.vertex_count(), self.traces.clone(), self.orientation.clone())
            .expect("valid vertex count")
    }

    /// Store with class-consistent random hypotheses and random codes
    pub fn scrambled_store<R: Rng + ?Sized>(&self, rng: &mut R) -> TraceStore<O> {
        let mut store = self.empty_store();
        store.randomize(&CandidatePool::new(store.vertex_count()), rng);
        store
    }

    pub fn has_overrides(&self) -> bool {
        self.traces.iter().any(|t| t.first_override().is_some())
    }

    /// Render in the text format accepted by `recon_trace::parse_input`
    ///
    /// The vertex count is the number of rooms, base vertices times layers.
    pub fn to_input_text(&self) -> String {
        let rooms = self.graph.vertex_count() * self.orientation.layers();
        let mut out = format!("{rooms}\n{}\n", self.traces.len());
        for trace in &self.traces {
            for (step, door) in trace.doors().iter().enumerate() {
                if let Some(label) = trace.override_at(step) {
                    out.push_str(&format!("[{label}]"));
                }
                out.push_str(&door.to_string());
            }
            out.push('\n');
        }
        for trace in &self.traces {
            for (step, label) in trace.labels().iter().enumerate() {
                out.push_str(&label.to_string());
                if let Some(echo) = trace.override_at(step) {
                    out.push_str(&echo.to_string());
                }
            }
            out.push('\n');
        }
        out
    }
}

/// Code undoing `code`
fn inverse_code<O: Orientation>(orientation: &O, code: u8) -> u8 {
    (0..orientation.codes() as u8)
        .find(|&back| (0..orientation.layers()).all(|l| orientation.apply(back, orientation.apply(code, l)) == l))
        .unwrap_or(0)
}

/// Random trace over the layered graph plus its true base vertices
///
/// Each door step rewrites the current room with probability
/// `override_percent`; no randomness is spent on overrides when it is 0.
fn layered_trace<O: Orientation, R: Rng + ?Sized>(
    graph: &HiddenGraph,
    codes: &[u8],
    orientation: &O,
    len: usize,
    override_percent: u32,
    rng: &mut R,
) -> (Trace, Vec<Vertex>) {
    let doors: Vec<Door> = (0..len).map(|_| Door::from_index(rng.gen_range(0..DOOR_COUNT))).collect();
    let overrides: Vec<Option<Label>> = if override_percent == 0 {
        vec![None; len]
    } else {
        (0..len)
            .map(|_| {
                if rng.gen_range(0..100) < override_percent {
                    Some(Label(rng.gen_range(0..LABEL_COUNT) as u8))
                } else {
                    None
                }
            })
            .collect()
    };

    let n = graph.vertex_count();
    let visited = graph.walk(&doors);
    let mut rooms: Vec<Option<Label>> = vec![None; n * orientation.layers()];
    let mut labels = Vec::with_capacity(len + 1);
    labels.push(visited[0].class());
    let mut layer = 0;
    for (step, &door) in doors.iter().enumerate() {
        if let Some(label) = overrides[step] {
            rooms[layer * n + visited[step].index()] = Some(label);
        }
        layer = orientation.apply(codes[DoorKey::new(visited[step], door).index()], layer);
        let next = visited[step + 1];
        labels.push(rooms[layer * n + next.index()].unwrap_or_else(|| next.class()));
    }

    let trace = Trace::with_overrides(doors, labels, overrides).expect("walk produces one label per step");
    (trace, visited)
}

/// Layered instance over `vertex_count` base vertices
///
/// Paired doors carry inverse codes, so walking a door and its partner
/// returns to the starting layer. Single-code orientations and a zero
/// `override_percent` draw exactly what [`random_instance`] draws.
pub fn random_layered_instance<O: Orientation, R: Rng + ?Sized>(
    orientation: O,
    vertex_count: usize,
    trace_count: usize,
    trace_len: usize,
    override_percent: u32,
    rng: &mut R,
) -> Instance<O> {
    let (graph, slots) = HiddenGraph::paired(vertex_count, rng);
    let mut codes = vec![0u8; slots.len()];
    if orientation.codes() > 1 {
        for pair in slots.chunks_exact(2) {
            let code = rng.gen_range(0..orientation.codes()) as u8;
            codes[pair[0].index()] = code;
            codes[pair[1].index()] = inverse_code(&orientation, code);
        }
    }
    let (traces, truth) = (0..trace_count)
        .map(|_| layered_trace(&graph, &codes, &orientation, trace_len, override_percent, rng))
        .unzip();
    Instance {
        graph,
        orientation,
        codes,
        traces,
        truth,
    }
}

pub fn random_instance<R: Rng + ?Sized>(
    vertex_count: usize,
    trace_count: usize,
    trace_len: usize,
    rng: &mut R,
) -> Instance {
    random_layered_instance(Plain, vertex_count, trace_count, trace_len, 0, rng)
}

pub fn seeded_instance(seed: u64, vertex_count: usize, trace_count: usize, trace_len: usize) -> Instance {
    random_instance(vertex_count, trace_count, trace_len, &mut StdRng::seed_from_u64(seed))
}

/// Single-layer instance whose traces rewrite labels as they go
pub fn seeded_override_instance(
    seed: u64,
    vertex_count: usize,
    trace_count: usize,
    trace_len: usize,
    override_percent: u32,
) -> Instance {
    seeded_layered_instance(Plain, seed, vertex_count, trace_count, trace_len, override_percent)
}

pub fn seeded_layered_instance<O: Orientation>(
    orientation: O,
    seed: u64,
    vertex_count: usize,
    trace_count: usize,
    trace_len: usize,
    override_percent: u32,
) -> Instance<O> {
    let mut rng = StdRng::seed_from_u64(seed);
    random_layered_instance(orientation, vertex_count, trace_count, trace_len, override_percent, &mut rng)
}

/// Four vertices, one trace of 24 doors
pub fn four_vertex_instance() -> Instance {
    seeded_instance(4, 4, 1, 24)
}
