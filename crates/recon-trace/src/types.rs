//! Identity newtypes for vertices, doors, labels and trace positions
//!
//! All of them are small `Copy` integers that index dense counter arrays.
//! The `index()` accessors exist so arrays can be addressed without
//! sprinkling `as usize` through the scoring code.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Number of doors (outgoing slots) on every vertex
pub const DOOR_COUNT: usize = 6;

/// Number of distinct observable labels
pub const LABEL_COUNT: usize = 4;

/// A hypothesized graph vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Vertex(pub u16);

impl Vertex {
    /// Vertex from a dense array index
    #[inline]
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        debug_assert!(index <= u16::MAX as usize);
        Self(index as u16)
    }

    /// Dense array index
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Label class this vertex belongs to
    #[inline]
    #[must_use]
    pub const fn class(self) -> Label {
        Label((self.0 as usize % LABEL_COUNT) as u8)
    }
}

impl Display for Vertex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A door direction, `0..DOOR_COUNT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Door(pub u8);

impl Door {
    /// Door from a dense array index
    #[inline]
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        debug_assert!(index < DOOR_COUNT);
        Self(index as u8)
    }

    /// Dense array index
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Every door direction in order
    pub fn all() -> impl Iterator<Item = Door> {
        (0..DOOR_COUNT).map(Door::from_index)
    }
}

impl Display for Door {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An observed room label, `0..LABEL_COUNT`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Label(pub u8);

impl Label {
    /// Dense array index
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A door slot on a specific vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DoorKey {
    /// Owning vertex
    pub vertex: Vertex,
    /// Direction
    pub door: Door,
}

impl DoorKey {
    /// Door `door` of `vertex`
    #[inline]
    #[must_use]
    pub const fn new(vertex: Vertex, door: Door) -> Self {
        Self { vertex, door }
    }

    /// Dense index into a `vertex_count * DOOR_COUNT` array
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.vertex.index() * DOOR_COUNT + self.door.index()
    }

    /// Inverse of [`DoorKey::index`]
    #[inline]
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        Self {
            vertex: Vertex::from_index(index / DOOR_COUNT),
            door: Door::from_index(index % DOOR_COUNT),
        }
    }
}

impl Display for DoorKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.vertex, self.door)
    }
}

/// A step within a specific trace
///
/// `step` addresses the hypothesis array, so it ranges over
/// `0..=trace.len()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Trace index
    pub trace: usize,
    /// Step within the trace; 0 is the start
    pub step: usize,
}

impl Position {
    /// Step `step` of `trace`
    #[inline]
    #[must_use]
    pub const fn new(trace: usize, step: usize) -> Self {
        Self { trace, step }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.trace, self.step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn door_key_index_round_trips() {
        let key = DoorKey::new(Vertex(7), Door(4));
        assert_eq!(key.index(), 7 * DOOR_COUNT + 4);
        assert_eq!(DoorKey::from_index(key.index()), key);
    }

    #[test]
    fn vertex_class_wraps_label_count() {
        assert_eq!(Vertex(0).class(), Label(0));
        assert_eq!(Vertex(5).class(), Label(1));
        assert_eq!(Vertex(11).class(), Label(3));
    }
}
