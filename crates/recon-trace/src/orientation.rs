//! Layered graphs: per-door layer permutations
//!
//! A layered graph stacks `layers()` copies of a base graph. Every base
//! door carries a code; walking through it moves the walker from layer
//! `l` to layer `apply(code, l)` of the destination. A room is a
//! `(vertex, layer)` pair and starts labelled with its vertex's class.

use crate::trace::Trace;
use crate::types::{DoorKey, Label, Vertex};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Layer permutation family
pub trait Orientation: Debug + Clone + Send + Sync {
    /// Copies of the base graph
    fn layers(&self) -> usize;

    /// Number of distinct door codes
    fn codes(&self) -> usize;

    /// Layer reached from `layer` through a door with `code`
    fn apply(&self, code: u8, layer: usize) -> usize;
}

/// Single layer, identity only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Plain;

impl Orientation for Plain {
    fn layers(&self) -> usize {
        1
    }

    fn codes(&self) -> usize {
        1
    }

    fn apply(&self, _code: u8, layer: usize) -> usize {
        layer
    }
}

/// Two layers: code 0 keeps the layer, code 1 swaps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mirror;

impl Orientation for Mirror {
    fn layers(&self) -> usize {
        2
    }

    fn codes(&self) -> usize {
        2
    }

    fn apply(&self, code: u8, layer: usize) -> usize {
        if code == 1 {
            1 - layer
        } else {
            layer
        }
    }
}

/// Three layers under the full symmetric group
///
/// | code | permutation |
/// |---|---|
/// | 0 | identity |
/// | 1 | rotate +1 |
/// | 2 | rotate +2 |
/// | 3 | swap 0 ↔ 1 |
/// | 4 | swap 0 ↔ 2 |
/// | 5 | swap 1 ↔ 2 |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Triad;

impl Orientation for Triad {
    fn layers(&self) -> usize {
        3
    }

    fn codes(&self) -> usize {
        6
    }

    fn apply(&self, code: u8, layer: usize) -> usize {
        match (code, layer) {
            (1, l) => (l + 1) % 3,
            (2, l) => (l + 2) % 3,
            (3, 0) | (5, 2) => 1,
            (3, 1) | (4, 2) => 0,
            (4, 0) | (5, 1) => 2,
            (_, l) => l,
        }
    }
}

/// Orientation named in configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layering {
    /// [`Plain`]
    #[default]
    Plain,
    /// [`Mirror`]
    Mirror,
    /// [`Triad`]
    Triad,
}

impl Layering {
    /// Layering with `layers` copies of the base graph
    #[must_use]
    pub fn from_layers(layers: usize) -> Option<Self> {
        match layers {
            1 => Some(Self::Plain),
            2 => Some(Self::Mirror),
            3 => Some(Self::Triad),
            _ => None,
        }
    }

    /// Copies of the base graph
    #[must_use]
    pub fn layers(self) -> usize {
        match self {
            Self::Plain => Plain.layers(),
            Self::Mirror => Mirror.layers(),
            Self::Triad => Triad.layers(),
        }
    }
}

/// Re-walk one trace through hypothesized vertices and door codes
///
/// Every room starts with its vertex's class as label and an override
/// rewrites the room the walker stands in. `on_miss(step)` is called for
/// each arrival step whose observed label disagrees; the count is returned.
/// Step 0 is the known start and is never checked.
pub fn label_misses<O, V, C, F>(
    orientation: &O,
    vertex_count: usize,
    trace: &Trace,
    vertex_at: V,
    code_of: C,
    mut on_miss: F,
) -> usize
where
    O: Orientation,
    V: Fn(usize) -> Vertex,
    C: Fn(DoorKey) -> u8,
    F: FnMut(usize),
{
    // traces without overrides only ever see class labels
    let mut rewritten: Vec<Option<Label>> = if trace.first_override().is_some() {
        vec![None; orientation.layers() * vertex_count]
    } else {
        Vec::new()
    };

    let mut misses = 0;
    let mut layer = 0;
    let mut here = vertex_at(0);
    for step in 0..trace.len() {
        if let Some(label) = trace.override_at(step) {
            rewritten[layer * vertex_count + here.index()] = Some(label);
        }
        let door = DoorKey::new(here, trace.door(step));
        layer = orientation.apply(code_of(door), layer);
        let next = vertex_at(step + 1);
        let seen = rewritten
            .get(layer * vertex_count + next.index())
            .copied()
            .flatten()
            .unwrap_or_else(|| next.class());
        if seen != trace.label(step + 1) {
            misses += 1;
            on_miss(step + 1);
        }
        here = next;
    }
    misses
}
