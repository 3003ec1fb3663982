//! Layered door tables
//!
//! A base table plus one orientation code per door. Vertex `v` of layer
//! `l` is vertex `l * base + v` of the expanded graph.

use crate::error::CompleteError;
use crate::table::DoorTable;
use recon_trace::{Door, DoorKey, Orientation, Plain, Vertex, DOOR_COUNT};

/// A base door table plus one orientation code per door
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayeredTable<O> {
    base: DoorTable,
    codes: Vec<u8>,
    orientation: O,
}

impl<O: Orientation> LayeredTable<O> {
    /// # Errors
    /// - [`CompleteError::CodeCount`] unless there is one code per door
    /// - [`CompleteError::CodeOutOfRange`] for a code the orientation lacks
    pub fn new(base: DoorTable, codes: Vec<u8>, orientation: O) -> Result<Self, CompleteError> {
        if codes.len() != base.targets().len() {
            return Err(CompleteError::CodeCount {
                expected: base.targets().len(),
                found: codes.len(),
            });
        }
        if let Some((index, &code)) = codes
            .iter()
            .enumerate()
            .find(|(_, c)| usize::from(**c) >= orientation.codes())
        {
            return Err(CompleteError::CodeOutOfRange {
                door: DoorKey::from_index(index),
                code,
            });
        }
        Ok(Self {
            base,
            codes,
            orientation,
        })
    }

    /// Plain single-layer view of a table
    #[must_use]
    pub fn base(&self) -> &DoorTable {
        &self.base
    }

    /// Layer permutation family
    #[must_use]
    pub fn orientation(&self) -> &O {
        &self.orientation
    }

    /// Follow `door` from base vertex `vertex` in `layer`
    #[inline]
    #[must_use]
    pub fn step(&self, vertex: Vertex, layer: usize, door: Door) -> (Vertex, usize) {
        let key = DoorKey::new(vertex, door);
        (
            self.base.target(key),
            self.orientation.apply(self.codes[key.index()], layer),
        )
    }

    /// Expanded table over `layers * base` vertices
    #[must_use]
    pub fn expand(&self) -> DoorTable {
        let n = self.base.vertex_count();
        let layers = self.orientation.layers();
        let mut targets = Vec::with_capacity(n * layers * DOOR_COUNT);
        for layer in 0..layers {
            for key in (0..n * DOOR_COUNT).map(DoorKey::from_index) {
                let (to, next) = self.step(key.vertex, layer, key.door);
                targets.push(Vertex::from_index(next * n + to.index()));
            }
        }
        DoorTable::from_parts(targets)
    }
}

impl LayeredTable<Plain> {
    /// Single-layer table with identity codes
    #[must_use]
    pub fn plain(base: DoorTable) -> Self {
        let codes = vec![0; base.targets().len()];
        Self {
            base,
            codes,
            orientation: Plain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_trace::{Mirror, Triad};

    #[test]
    fn mirror_expansion_crosses_layers() {
        let mut base = DoorTable::self_loops(2);
        base.set(DoorKey::new(Vertex(0), Door(0)), Vertex(1));
        let mut codes = vec![0; 12];
        codes[0] = 1;
        let layered = LayeredTable::new(base, codes, Mirror).unwrap();
        let full = layered.expand();
        assert_eq!(full.vertex_count(), 4);
        // layer 0 vertex 0 → layer 1 vertex 1 = 3; layer 1 vertex 0 (= 2) → 1
        assert_eq!(full.target(DoorKey::new(Vertex(0), Door(0))), Vertex(3));
        assert_eq!(full.target(DoorKey::new(Vertex(2), Door(0))), Vertex(1));
        assert_eq!(full.target(DoorKey::new(Vertex(3), Door(2))), Vertex(3));
    }

    #[test]
    fn rejects_unknown_codes() {
        let base = DoorTable::self_loops(1);
        let err = LayeredTable::new(base.clone(), vec![0, 0, 2, 0, 0, 0], Mirror).unwrap_err();
        assert!(matches!(err, CompleteError::CodeOutOfRange { code: 2, .. }));
        assert!(matches!(
            LayeredTable::new(base, vec![0; 5], Triad),
            Err(CompleteError::CodeCount { expected: 6, found: 5 })
        ));
    }
}
