//! Candidate move proposals

use crate::config::MoveConfig;
use rand::Rng;
use recon_trace::{CandidatePool, Orientation, Position, Reassignment, Recode, TraceStore};

/// What a [`Proposal`] changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// One position gets a new vertex
    Single,
    /// Every position sharing a transition is redirected to one target
    Group,
    /// One door gets a new orientation code
    Recode,
}

/// A move to score as one atomic changeset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    /// Move family, for logging
    pub kind: MoveKind,
    /// Hypothesis changes; empty for [`MoveKind::Recode`]
    pub reassignments: Vec<Reassignment>,
    /// Door code change of a [`MoveKind::Recode`] move
    pub recode: Option<Recode>,
}

impl Proposal {
    fn moves(kind: MoveKind, reassignments: Vec<Reassignment>) -> Self {
        Self {
            kind,
            reassignments,
            recode: None,
        }
    }
}

/// Proposes reassignments, biased toward currently inconsistent positions
#[derive(Debug, Clone)]
pub struct MoveGenerator {
    config: MoveConfig,
    pool: CandidatePool,
}

impl MoveGenerator {
    /// Generator drawing replacement vertices from `pool`
    #[must_use]
    pub fn new(config: MoveConfig, pool: CandidatePool) -> Self {
        Self { config, pool }
    }

    /// Candidate pool replacement vertices come from
    #[inline]
    #[must_use]
    pub fn pool(&self) -> &CandidatePool {
        &self.pool
    }

    /// Draw one proposal
    ///
    /// Returns `None` for no-op draws (same vertex, empty group) and for
    /// stores without movable positions. Recodes are only drawn when the
    /// orientation has more than one code.
    pub fn propose<O: Orientation, R: Rng + ?Sized>(
        &self,
        store: &TraceStore<O>,
        bad: &[Position],
        rng: &mut R,
    ) -> Option<Proposal> {
        if store.movable_positions() == 0 {
            return None;
        }
        if store.orientation().codes() > 1 && rng.gen_range(0..100) < self.config.recode_percent {
            return self.propose_recode(store, rng);
        }
        if rng.gen_range(0..100) < self.config.group_move_percent {
            self.propose_group(store, rng)
        } else {
            self.propose_single(store, bad, rng)
        }
    }

    /// Move one position to a fresh class-consistent vertex
    pub fn propose_single<O: Orientation, R: Rng + ?Sized>(
        &self,
        store: &TraceStore<O>,
        bad: &[Position],
        rng: &mut R,
    ) -> Option<Proposal> {
        let position = if !bad.is_empty() && rng.gen_range(0..100) < self.config.bad_pick_percent {
            bad[rng.gen_range(0..bad.len())]
        } else {
            random_step(store, rng).map(|(trace, step)| Position::new(trace, step + 1))?
        };
        let next = self.pool.draw(store.required_label(position), rng);
        if next == store.vertex_at(position) {
            return None;
        }
        Some(Proposal::moves(MoveKind::Single, vec![Reassignment::new(position, next)]))
    }

    /// Take a random committed transition `from -door-> to` and redirect
    /// every other occurrence of `from -door->` whose destination may carry
    /// `to`'s label onto `to`
    pub fn propose_group<O: Orientation, R: Rng + ?Sized>(&self, store: &TraceStore<O>, rng: &mut R) -> Option<Proposal> {
        let (trace, step) = random_step(store, rng)?;
        let (door, target) = store.edge_at(trace, step);

        let mut reassignments = Vec::new();
        for (t, s, key, to) in store.edges() {
            if key != door || to == target {
                continue;
            }
            let position = Position::new(t, s + 1);
            if store
                .required_label(position)
                .map_or(true, |label| label == target.class())
            {
                reassignments.push(Reassignment::new(position, target));
            }
        }
        if reassignments.is_empty() {
            return None;
        }
        Some(Proposal::moves(MoveKind::Group, reassignments))
    }

    /// Give the door of a random committed transition a different code
    pub fn propose_recode<O: Orientation, R: Rng + ?Sized>(
        &self,
        store: &TraceStore<O>,
        rng: &mut R,
    ) -> Option<Proposal> {
        let codes = store.orientation().codes();
        if codes <= 1 {
            return None;
        }
        let (trace, step) = random_step(store, rng)?;
        let (door, _) = store.edge_at(trace, step);
        let current = store.code(door);
        let mut code = rng.gen_range(0..codes - 1) as u8;
        if code >= current {
            code += 1;
        }
        Some(Proposal {
            kind: MoveKind::Recode,
            reassignments: Vec::new(),
            recode: Some(Recode::new(door, code)),
        })
    }
}

/// Uniform door step over all traces
fn random_step<O: Orientation, R: Rng + ?Sized>(store: &TraceStore<O>, rng: &mut R) -> Option<(usize, usize)> {
    let total = store.movable_positions();
    (total > 0).then(|| store.door_step(rng.gen_range(0..total)))
}
