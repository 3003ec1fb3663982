//! Fully defined door graphs

use recon_trace::{DoorKey, Vertex, DOOR_COUNT};
use serde::Serialize;
use std::fmt::{self, Display, Formatter};

/// One destination per `(vertex, door)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DoorTable {
    targets: Vec<Vertex>,
}

impl DoorTable {
    /// Table of `vertex_count` vertices with every door a self-loop
    #[must_use]
    pub fn self_loops(vertex_count: usize) -> Self {
        Self {
            targets: (0..vertex_count * DOOR_COUNT)
                .map(|i| Vertex::from_index(i / DOOR_COUNT))
                .collect(),
        }
    }

    /// Table from targets in `(vertex, door)` order
    ///
    /// Returns `None` unless the length is a multiple of [`DOOR_COUNT`].
    #[must_use]
    pub fn from_targets(targets: Vec<Vertex>) -> Option<Self> {
        (targets.len() % DOOR_COUNT == 0).then_some(Self { targets })
    }

    /// Caller guarantees `targets.len()` is a multiple of [`DOOR_COUNT`]
    pub(crate) fn from_parts(targets: Vec<Vertex>) -> Self {
        debug_assert_eq!(targets.len() % DOOR_COUNT, 0);
        Self { targets }
    }

    /// Vertices covered
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.targets.len() / DOOR_COUNT
    }

    /// Destination of `door`
    #[inline]
    #[must_use]
    pub fn target(&self, door: DoorKey) -> Vertex {
        self.targets[door.index()]
    }

    /// Point `door` at `to`
    #[inline]
    pub fn set(&mut self, door: DoorKey, to: Vertex) {
        self.targets[door.index()] = to;
    }

    /// Targets in `(vertex, door)` order
    #[inline]
    #[must_use]
    pub fn targets(&self) -> &[Vertex] {
        &self.targets
    }
}

/// Space-separated targets on one line
impl Display for DoorTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, v) in self.targets.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_trace::Door;

    #[test]
    fn renders_targets_in_door_order() {
        let mut table = DoorTable::self_loops(2);
        table.set(DoorKey::new(Vertex(0), Door(5)), Vertex(1));
        assert_eq!(table.to_string(), "0 0 0 0 0 1 1 1 1 1 1 1");
    }

    #[test]
    fn rejects_ragged_targets() {
        assert!(DoorTable::from_targets(vec![Vertex(0); 7]).is_none());
        assert_eq!(DoorTable::from_targets(vec![Vertex(0); 12]).map(|t| t.vertex_count()), Some(2));
    }
}
