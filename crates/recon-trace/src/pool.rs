//! Label class → candidate vertex pools

use crate::types::{Label, Vertex, LABEL_COUNT};
use rand::Rng;

/// Precomputed candidate vertices per label class
///
/// Vertex `v` carries label `v % LABEL_COUNT`, so a step that observed label
/// `l` can only be hypothesized as a vertex from `class(l)`.
#[derive(Debug, Clone)]
pub struct CandidatePool {
    by_class: [Vec<Vertex>; LABEL_COUNT],
    all: Vec<Vertex>,
}

impl CandidatePool {
    /// Build pools for vertices `0..vertex_count`
    #[must_use]
    pub fn new(vertex_count: usize) -> Self {
        let mut by_class: [Vec<Vertex>; LABEL_COUNT] = Default::default();
        let all: Vec<Vertex> = (0..vertex_count).map(Vertex::from_index).collect();
        for &v in &all {
            by_class[v.class().index()].push(v);
        }
        Self { by_class, all }
    }

    /// Vertices whose class matches `label`
    #[inline]
    #[must_use]
    pub fn class(&self, label: Label) -> &[Vertex] {
        &self.by_class[label.index()]
    }

    /// Every vertex
    #[inline]
    #[must_use]
    pub fn all(&self) -> &[Vertex] {
        &self.all
    }

    /// Draw a candidate for a step
    ///
    /// `Some(label)` restricts the draw to that class; `None` draws from
    /// every vertex. An empty class (fewer vertices than labels) falls back
    /// to every vertex.
    pub fn draw<R: Rng + ?Sized>(&self, label: Option<Label>, rng: &mut R) -> Vertex {
        let pool = match label {
            Some(l) if !self.by_class[l.index()].is_empty() => &self.by_class[l.index()],
            _ => &self.all,
        };
        pool[rng.gen_range(0..pool.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn pools_partition_vertices_by_class() {
        let pool = CandidatePool::new(10);
        assert_eq!(pool.class(Label(0)), &[Vertex(0), Vertex(4), Vertex(8)]);
        assert_eq!(pool.class(Label(3)), &[Vertex(3), Vertex(7)]);
        let total: usize = (0..LABEL_COUNT as u8).map(|l| pool.class(Label(l)).len()).sum();
        assert_eq!(total, 10);
    }

    #[test]
    fn draw_respects_class() {
        let pool = CandidatePool::new(12);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            assert_eq!(pool.draw(Some(Label(2)), &mut rng).class(), Label(2));
        }
    }

    #[test]
    fn empty_class_falls_back_to_all() {
        let pool = CandidatePool::new(2);
        let mut rng = StdRng::seed_from_u64(1);
        let v = pool.draw(Some(Label(3)), &mut rng);
        assert!(v.index() < 2);
    }
}
