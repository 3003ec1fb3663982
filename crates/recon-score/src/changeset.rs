//! Signed edge-vote deltas
//!
//! A [`ChangeSet`] describes one proposed mutation of the hypothesis in
//! terms of the edge votes it removes and adds, plus the change in replayed
//! label mismatches of every trace it affects. It never touches committed
//! state on its own; see [`crate::ScoreEngine::stage`].

use recon_trace::{DoorKey, Vertex};
use smallvec::SmallVec;
use std::fmt::{self, Display, Formatter};

/// A hypothesized transition: door `door` leads to `to`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edge {
    /// Source vertex and door taken
    pub door: DoorKey,
    /// Destination vertex
    pub to: Vertex,
}

impl Edge {
    /// Vote of `door` for `to`
    #[inline]
    #[must_use]
    pub const fn new(door: DoorKey, to: Vertex) -> Self {
        Self { door, to }
    }
}

impl Display for Edge {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.door, self.to)
    }
}

/// One signed vote adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeDelta {
    /// Transition whose vote count changes
    pub edge: Edge,
    /// Votes added (positive) or removed (negative)
    pub delta: i32,
}

/// Change in one trace's replayed label mismatches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissDelta {
    /// Trace index in the store
    pub trace: usize,
    /// Mismatches gained (positive) or lost (negative)
    pub delta: i32,
}

/// Ordered list of deltas forming one atomic move
///
/// Single repositions produce at most four edge entries, which fit inline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    entries: SmallVec<[EdgeDelta; 8]>,
    misses: SmallVec<[MissDelta; 2]>,
}

impl ChangeSet {
    /// Empty changeset
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a delta
    #[inline]
    pub fn push(&mut self, edge: Edge, delta: i32) {
        self.entries.push(EdgeDelta { edge, delta });
    }

    /// Move one vote from `from` to `to`
    #[inline]
    pub fn redirect(&mut self, from: Edge, to: Edge) {
        self.push(from, -1);
        self.push(to, 1);
    }

    /// Record a change in `trace`'s mismatch count; zero changes are dropped
    #[inline]
    pub fn push_misses(&mut self, trace: usize, delta: i32) {
        if delta != 0 {
            self.misses.push(MissDelta { trace, delta });
        }
    }

    /// Edge entries in insertion order
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[EdgeDelta] {
        &self.entries
    }

    /// Per-trace mismatch changes
    #[inline]
    #[must_use]
    pub fn misses(&self) -> &[MissDelta] {
        &self.misses
    }

    /// Number of edge entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// No edge and no mismatch changes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.misses.is_empty()
    }

    /// The exact inverse of this changeset
    #[must_use]
    pub fn negated(&self) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|e| EdgeDelta {
                    edge: e.edge,
                    delta: -e.delta,
                })
                .collect(),
            misses: self
                .misses
                .iter()
                .map(|m| MissDelta {
                    trace: m.trace,
                    delta: -m.delta,
                })
                .collect(),
        }
    }

    /// Total number of votes is unchanged
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.entries.iter().map(|e| i64::from(e.delta)).sum::<i64>() == 0
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a EdgeDelta;
    type IntoIter = std::slice::Iter<'a, EdgeDelta>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
