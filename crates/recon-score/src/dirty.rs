//! Dense dirty-key tracking
//!
//! Every key space here is small and fixed (vertices × doors × vertices at
//! most), so membership is a flat mark array and iteration walks an
//! insertion-ordered key list. Clearing costs the number of touched keys,
//! not the size of the graph.

use recon_trace::{DoorKey, Vertex, DOOR_COUNT};

/// Mark array plus insertion-ordered members
#[derive(Debug, Clone)]
struct MarkedList<K> {
    marks: Vec<bool>,
    keys: Vec<K>,
}

impl<K> Default for MarkedList<K> {
    fn default() -> Self {
        Self {
            marks: Vec::new(),
            keys: Vec::new(),
        }
    }
}

impl<K: Copy> MarkedList<K> {
    fn with_capacity(slots: usize) -> Self {
        Self {
            marks: vec![false; slots],
            keys: Vec::new(),
        }
    }

    /// Insert `key` stored at `slot`; returns whether it was new
    #[inline]
    fn insert(&mut self, slot: usize, key: K) -> bool {
        if self.marks[slot] {
            return false;
        }
        self.marks[slot] = true;
        self.keys.push(key);
        true
    }

    #[inline]
    fn contains(&self, slot: usize) -> bool {
        self.marks.get(slot).copied().unwrap_or(false)
    }

    fn clear_with(&mut self, slot_of: impl Fn(&K) -> usize) {
        for key in &self.keys {
            self.marks[slot_of(key)] = false;
        }
        self.keys.clear();
    }
}

/// Keys touched by the currently staged changeset
///
/// Five key spaces are tracked:
/// - doors `(vertex, door)` whose vote total may change
/// - edges `(vertex, door, destination)` whose vote count may change
/// - ordered vertex pairs `(x, y)` whose link counts may change
/// - vertices whose degree aggregate may change
/// - traces whose replayed mismatch count may change
#[derive(Debug, Clone, Default)]
pub struct DirtySets {
    vertex_count: usize,
    doors: MarkedList<DoorKey>,
    edges: MarkedList<(DoorKey, Vertex)>,
    pairs: MarkedList<(Vertex, Vertex)>,
    vertices: MarkedList<Vertex>,
    traces: MarkedList<usize>,
}

impl DirtySets {
    /// Empty tracker sized for `vertex_count` vertices and `trace_count`
    /// traces
    #[must_use]
    pub fn new(vertex_count: usize, trace_count: usize) -> Self {
        let doors = vertex_count * DOOR_COUNT;
        Self {
            vertex_count,
            doors: MarkedList::with_capacity(doors),
            edges: MarkedList::with_capacity(doors * vertex_count),
            pairs: MarkedList::with_capacity(vertex_count * vertex_count),
            vertices: MarkedList::with_capacity(vertex_count),
            traces: MarkedList::with_capacity(trace_count),
        }
    }

    /// Vertex space the mark arrays are sized for
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Trace space the mark arrays are sized for
    #[inline]
    #[must_use]
    pub fn trace_count(&self) -> usize {
        self.traces.marks.len()
    }

    /// Register every key an edge-vote delta can affect
    ///
    /// Returns `true` if the edge itself was not yet dirty.
    pub fn touch_edge(&mut self, door: DoorKey, to: Vertex) -> bool {
        let n = self.vertex_count;
        let from = door.vertex;
        self.doors.insert(door.index(), door);
        self.vertices.insert(from.index(), from);
        self.vertices.insert(to.index(), to);
        self.pairs.insert(from.index() * n + to.index(), (from, to));
        self.pairs.insert(to.index() * n + from.index(), (to, from));
        self.edges.insert(door.index() * n + to.index(), (door, to))
    }

    /// Register a trace whose mismatch count changes; returns whether it
    /// was new
    #[inline]
    pub fn touch_trace(&mut self, trace: usize) -> bool {
        self.traces.insert(trace, trace)
    }

    /// Touched doors in first-touch order
    #[inline]
    #[must_use]
    pub fn doors(&self) -> &[DoorKey] {
        &self.doors.keys
    }

    /// Touched `(door, destination)` votes
    #[inline]
    #[must_use]
    pub fn edges(&self) -> &[(DoorKey, Vertex)] {
        &self.edges.keys
    }

    /// Touched ordered vertex pairs
    #[inline]
    #[must_use]
    pub fn pairs(&self) -> &[(Vertex, Vertex)] {
        &self.pairs.keys
    }

    /// Vertices whose degree may change
    #[inline]
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices.keys
    }

    /// Traces with a staged mismatch change
    #[inline]
    #[must_use]
    pub fn traces(&self) -> &[usize] {
        &self.traces.keys
    }

    /// Whether `door` is touched
    #[inline]
    #[must_use]
    pub fn contains_door(&self, door: DoorKey) -> bool {
        self.doors.contains(door.index())
    }

    /// Whether `vertex` is touched
    #[inline]
    #[must_use]
    pub fn contains_vertex(&self, vertex: Vertex) -> bool {
        self.vertices.contains(vertex.index())
    }

    /// Whether `trace` is touched
    #[inline]
    #[must_use]
    pub fn contains_trace(&self, trace: usize) -> bool {
        self.traces.contains(trace)
    }

    /// Nothing touched in any key space
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.keys.is_empty() && self.traces.keys.is_empty()
    }

    /// Forget every key
    pub fn clear(&mut self) {
        let n = self.vertex_count;
        self.doors.clear_with(|d| d.index());
        self.edges.clear_with(|(d, to)| d.index() * n + to.index());
        self.pairs.clear_with(|(x, y)| x.index() * n + y.index());
        self.vertices.clear_with(|v| v.index());
        self.traces.clear_with(|&t| t);
    }
}
