//! Committed counters and the stage / score / commit / discard protocol
//!
//! # Protocol
//!
//! 1. [`ScoreEngine::stage`] accumulates a [`ChangeSet`] into diff buffers
//!    and registers touched keys in [`DirtySets`]. Committed counters are
//!    untouched.
//! 2. [`ScoreEngine::score_delta`] evaluates "committed + staged" minus
//!    "committed" over the touched keys only.
//! 3. Either [`ScoreEngine::commit`] folds the diffs into the committed
//!    counters (after the caller has applied the move to the store), or
//!    [`ScoreEngine::discard`] drops them.
//!
//! # Invariants
//! - `totals[door] == Σ_w votes[door][w]` after every commit
//! - `misses[t]` is the replayed label mismatch count of trace `t`
//! - committed counters equal what [`ScoreEngine::full_rescan`] builds from
//!   the current hypotheses
//! - diff buffers are all zero whenever nothing is staged

use crate::changeset::ChangeSet;
use crate::dirty::DirtySets;
use crate::error::ScoreError;
use crate::score::{Score, ScoreConfig, ScoreDelta};
use recon_trace::{DoorKey, Orientation, Position, TraceStore, Vertex, DOOR_COUNT};

/// Owner of every committed aggregate counter
#[derive(Debug, Clone)]
pub struct ScoreEngine {
    config: ScoreConfig,
    vertex_count: usize,

    /// `votes[door * n + w]`: steps hypothesizing `door -> w`
    votes: Vec<i32>,
    /// `totals[door]`: all votes cast at `door`
    totals: Vec<i32>,
    /// `out_links[x * n + y]`: doors of `x` with a vote toward `y`
    out_links: Vec<i32>,
    /// `in_links[x * n + y]`: doors of `y` with a vote toward `x`
    in_links: Vec<i32>,
    /// `degrees[x] = Σ_y max(in_links[x][y], out_links[x][y])`
    degrees: Vec<i32>,
    /// `misses[t]`: arrivals of trace `t` whose replayed label disagrees
    misses: Vec<i32>,

    vote_diff: Vec<i32>,
    total_diff: Vec<i32>,
    out_diff: Vec<i32>,
    in_diff: Vec<i32>,
    degree_diff: Vec<i32>,
    miss_diff: Vec<i32>,

    dirty: DirtySets,
    staged: bool,
    score: Score,

    bad: Vec<Position>,
    bad_marks: Vec<Vec<bool>>,
}

impl ScoreEngine {
    /// Empty engine; call [`ScoreEngine::full_rescan`] before use
    #[must_use]
    pub fn new(config: ScoreConfig) -> Self {
        Self {
            config,
            vertex_count: 0,
            votes: Vec::new(),
            totals: Vec::new(),
            out_links: Vec::new(),
            in_links: Vec::new(),
            degrees: Vec::new(),
            misses: Vec::new(),
            vote_diff: Vec::new(),
            total_diff: Vec::new(),
            out_diff: Vec::new(),
            in_diff: Vec::new(),
            degree_diff: Vec::new(),
            miss_diff: Vec::new(),
            dirty: DirtySets::new(0, 0),
            staged: false,
            score: Score::default(),
            bad: Vec::new(),
            bad_marks: Vec::new(),
        }
    }

    /// Engine with counters built from `store`
    #[must_use]
    pub fn from_store<O: Orientation>(store: &TraceStore<O>, config: ScoreConfig) -> Self {
        let mut engine = Self::new(config);
        engine.full_rescan(store);
        engine
    }

    /// Rebuild every counter, the score and the bad-position list
    ///
    /// Any staged changeset is discarded first.
    pub fn full_rescan<O: Orientation>(&mut self, store: &TraceStore<O>) -> Score {
        self.discard();
        let n = store.vertex_count();
        let traces = store.trace_count();
        if n != self.vertex_count || traces != self.dirty.trace_count() {
            self.vertex_count = n;
            self.dirty = DirtySets::new(n, traces);
        }
        let doors = n * DOOR_COUNT;
        for (buf, len) in [
            (&mut self.votes, doors * n),
            (&mut self.vote_diff, doors * n),
            (&mut self.totals, doors),
            (&mut self.total_diff, doors),
            (&mut self.out_links, n * n),
            (&mut self.out_diff, n * n),
            (&mut self.in_links, n * n),
            (&mut self.in_diff, n * n),
            (&mut self.degrees, n),
            (&mut self.degree_diff, n),
            (&mut self.misses, traces),
            (&mut self.miss_diff, traces),
        ] {
            buf.clear();
            buf.resize(len, 0);
        }

        for (_, _, door, to) in store.edges() {
            self.votes[door.index() * n + to.index()] += 1;
            self.totals[door.index()] += 1;
        }

        let mut conflict = 0i64;
        for door in 0..doors {
            let x = door / DOOR_COUNT;
            let total = i64::from(self.totals[door]);
            for w in 0..n {
                let c = self.votes[door * n + w];
                if c > 0 {
                    self.out_links[x * n + w] += 1;
                    self.in_links[w * n + x] += 1;
                    conflict += i64::from(c) * (total - i64::from(c));
                }
            }
        }

        let mut excess = 0i64;
        for x in 0..n {
            self.degrees[x] = (0..n)
                .map(|y| self.in_links[x * n + y].max(self.out_links[x * n + y]))
                .sum();
            excess += self.excess_of(self.degrees[x]);
        }

        let mut mismatch = 0i64;
        for t in 0..traces {
            let count = store.label_misses(t, |_| {});
            self.misses[t] = count as i32;
            mismatch += count as i64;
        }

        self.score = Score {
            conflict,
            excess,
            mismatch,
        };
        self.refresh_bad(store);
        tracing::debug!(score = %self.score, bad = self.bad.len(), "full rescan");
        self.score
    }

    /// Accumulate a changeset into the diff buffers
    ///
    /// # Errors
    /// - [`ScoreError::AlreadyStaged`] if a changeset is pending
    /// - [`ScoreError::VertexOutOfRange`] if an entry names an unknown vertex
    /// - [`ScoreError::TraceOutOfRange`] if a mismatch change names an
    ///   unknown trace
    ///
    /// Nothing is staged on error.
    pub fn stage(&mut self, changeset: &ChangeSet) -> Result<(), ScoreError> {
        if self.staged {
            return Err(ScoreError::AlreadyStaged);
        }
        let n = self.vertex_count;
        for entry in changeset {
            for v in [entry.edge.door.vertex, entry.edge.to] {
                if v.index() >= n {
                    return Err(ScoreError::VertexOutOfRange {
                        vertex: v.index(),
                        vertex_count: n,
                    });
                }
            }
        }
        if let Some(m) = changeset.misses().iter().find(|m| m.trace >= self.misses.len()) {
            return Err(ScoreError::TraceOutOfRange {
                trace: m.trace,
                trace_count: self.misses.len(),
            });
        }

        for m in changeset.misses() {
            self.miss_diff[m.trace] += m.delta;
            self.dirty.touch_trace(m.trace);
        }

        for entry in changeset {
            let door = entry.edge.door;
            self.vote_diff[door.index() * n + entry.edge.to.index()] += entry.delta;
            self.total_diff[door.index()] += entry.delta;
            self.dirty.touch_edge(door, entry.edge.to);
        }

        let votes = &self.votes;
        let vote_diff = &self.vote_diff;
        for &(x, y) in self.dirty.pairs() {
            let xy = x.index() * n + y.index();
            let out_next = staged_links(votes, vote_diff, n, x, y);
            let in_next = staged_links(votes, vote_diff, n, y, x);
            let out_now = self.out_links[xy];
            let in_now = self.in_links[xy];
            self.out_diff[xy] = out_next - out_now;
            self.in_diff[xy] = in_next - in_now;
            self.degree_diff[x.index()] += in_next.max(out_next) - in_now.max(out_now);
        }

        self.staged = true;
        Ok(())
    }

    /// Score change the staged changeset would cause
    ///
    /// Only dirty keys are visited; the score decomposes additively over
    /// doors, vertices and traces, so untouched keys contribute nothing.
    /// Returns a zero delta when nothing is staged.
    #[must_use]
    pub fn score_delta(&self) -> ScoreDelta {
        let n = self.vertex_count;
        let mut conflict = 0i64;
        for door in self.dirty.doors() {
            let i = door.index();
            let now = i64::from(self.totals[i]);
            let next = now + i64::from(self.total_diff[i]);
            conflict += next * next - now * now;
        }
        for (door, to) in self.dirty.edges() {
            let slot = door.index() * n + to.index();
            let now = i64::from(self.votes[slot]);
            let next = now + i64::from(self.vote_diff[slot]);
            conflict -= next * next - now * now;
        }

        let mut excess = 0i64;
        for v in self.dirty.vertices() {
            let now = self.degrees[v.index()];
            let next = now + self.degree_diff[v.index()];
            excess += self.excess_of(next) - self.excess_of(now);
        }

        let mismatch = self
            .dirty
            .traces()
            .iter()
            .map(|&t| i64::from(self.miss_diff[t]))
            .sum();

        ScoreDelta {
            conflict,
            excess,
            mismatch,
        }
    }

    /// Weighted scalar of [`ScoreEngine::score_delta`]
    #[inline]
    #[must_use]
    pub fn score_delta_value(&self) -> f64 {
        self.score_delta().value(&self.config)
    }

    /// Fold staged diffs into the committed counters
    ///
    /// `store` must already reflect the staged move; it is rescanned to
    /// refresh the bad-position list.
    ///
    /// # Errors
    /// Returns [`ScoreError::NothingStaged`] if no changeset is pending.
    pub fn commit<O: Orientation>(&mut self, store: &TraceStore<O>) -> Result<ScoreDelta, ScoreError> {
        if !self.staged {
            return Err(ScoreError::NothingStaged);
        }
        let delta = self.score_delta();
        let n = self.vertex_count;

        for (door, to) in self.dirty.edges() {
            let slot = door.index() * n + to.index();
            self.votes[slot] += std::mem::take(&mut self.vote_diff[slot]);
        }
        for door in self.dirty.doors() {
            let i = door.index();
            self.totals[i] += std::mem::take(&mut self.total_diff[i]);
        }
        for (x, y) in self.dirty.pairs() {
            let xy = x.index() * n + y.index();
            self.out_links[xy] += std::mem::take(&mut self.out_diff[xy]);
            self.in_links[xy] += std::mem::take(&mut self.in_diff[xy]);
        }
        for v in self.dirty.vertices() {
            let i = v.index();
            self.degrees[i] += std::mem::take(&mut self.degree_diff[i]);
        }
        for &t in self.dirty.traces() {
            self.misses[t] += std::mem::take(&mut self.miss_diff[t]);
        }

        self.score += delta;
        self.dirty.clear();
        self.staged = false;
        self.refresh_bad(store);
        Ok(delta)
    }

    /// Drop the staged changeset; committed counters are untouched
    ///
    /// Calling this with nothing staged is a no-op.
    pub fn discard(&mut self) {
        let n = self.vertex_count;
        for (door, to) in self.dirty.edges() {
            self.vote_diff[door.index() * n + to.index()] = 0;
        }
        for door in self.dirty.doors() {
            self.total_diff[door.index()] = 0;
        }
        for (x, y) in self.dirty.pairs() {
            let xy = x.index() * n + y.index();
            self.out_diff[xy] = 0;
            self.in_diff[xy] = 0;
        }
        for v in self.dirty.vertices() {
            self.degree_diff[v.index()] = 0;
        }
        for &t in self.dirty.traces() {
            self.miss_diff[t] = 0;
        }
        self.dirty.clear();
        self.staged = false;
    }

    /// Compare committed state against a fresh full scan of `store`
    ///
    /// # Errors
    /// Returns the first mismatching counter or score component.
    pub fn verify<O: Orientation>(&self, store: &TraceStore<O>) -> Result<(), ScoreError> {
        let fresh = Self::from_store(store, self.config);
        if fresh.vertex_count != self.vertex_count {
            return Err(ScoreError::Drift {
                counter: "vertex_count",
                index: 0,
                committed: self.vertex_count as i64,
                rescan: fresh.vertex_count as i64,
            });
        }
        compare("votes", &self.votes, &fresh.votes)?;
        compare("totals", &self.totals, &fresh.totals)?;
        compare("out_links", &self.out_links, &fresh.out_links)?;
        compare("in_links", &self.in_links, &fresh.in_links)?;
        compare("degrees", &self.degrees, &fresh.degrees)?;
        compare("misses", &self.misses, &fresh.misses)?;
        if self.score != fresh.score {
            return Err(ScoreError::ScoreDrift {
                committed: self.score,
                rescan: fresh.score,
            });
        }
        Ok(())
    }

    /// Check `totals[door] == Σ_w votes[door][w]` for every door
    ///
    /// # Errors
    /// Returns [`ScoreError::Drift`] for the first inconsistent door.
    pub fn check_door_totals(&self) -> Result<(), ScoreError> {
        let n = self.vertex_count;
        for (door, &total) in self.totals.iter().enumerate() {
            let sum: i32 = self.votes[door * n..(door + 1) * n].iter().sum();
            if sum != total {
                return Err(ScoreError::Drift {
                    counter: "totals",
                    index: door,
                    committed: i64::from(total),
                    rescan: i64::from(sum),
                });
            }
        }
        Ok(())
    }

    /// Scoring parameters
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ScoreConfig {
        &self.config
    }

    /// Base vertices the counters are sized for
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Committed score
    #[inline]
    #[must_use]
    pub fn score(&self) -> Score {
        self.score
    }

    /// Weighted scalar of the committed score
    #[inline]
    #[must_use]
    pub fn score_value(&self) -> f64 {
        self.score.value(&self.config)
    }

    /// A changeset is waiting for commit or discard
    #[inline]
    #[must_use]
    pub fn is_staged(&self) -> bool {
        self.staged
    }

    /// Keys touched by the staged changeset
    #[inline]
    #[must_use]
    pub fn dirty(&self) -> &DirtySets {
        &self.dirty
    }

    /// Committed votes for `door -> to`
    #[inline]
    #[must_use]
    pub fn votes(&self, door: DoorKey, to: Vertex) -> i32 {
        self.votes[door.index() * self.vertex_count + to.index()]
    }

    /// Committed votes at `door`, indexed by destination
    #[inline]
    #[must_use]
    pub fn door_votes(&self, door: DoorKey) -> &[i32] {
        let n = self.vertex_count;
        &self.votes[door.index() * n..(door.index() + 1) * n]
    }

    /// Committed votes cast at `door`, over all destinations
    #[inline]
    #[must_use]
    pub fn door_total(&self, door: DoorKey) -> i32 {
        self.totals[door.index()]
    }

    /// Committed degree aggregate of `vertex`
    #[inline]
    #[must_use]
    pub fn degree(&self, vertex: Vertex) -> i32 {
        self.degrees[vertex.index()]
    }

    /// Committed replayed label mismatches of one trace
    #[inline]
    #[must_use]
    pub fn trace_misses(&self, trace: usize) -> i32 {
        self.misses[trace]
    }

    /// Positions whose hypothesis conflicts with the committed counters
    #[inline]
    #[must_use]
    pub fn bad_positions(&self) -> &[Position] {
        &self.bad
    }

    #[inline]
    fn excess_of(&self, degree: i32) -> i64 {
        (i64::from(degree) - i64::from(self.config.degree_budget)).max(0)
    }

    fn refresh_bad<O: Orientation>(&mut self, store: &TraceStore<O>) {
        for p in self.bad.drain(..) {
            self.bad_marks[p.trace][p.step] = false;
        }
        let shape_matches = self.bad_marks.len() == store.trace_count()
            && self
                .bad_marks
                .iter()
                .zip(store.traces())
                .all(|(marks, t)| marks.len() == t.len() + 1);
        if !shape_matches {
            self.bad_marks = store.traces().iter().map(|t| vec![false; t.len() + 1]).collect();
        }

        let n = self.vertex_count;
        let budget = i64::from(self.config.degree_budget);
        for t in 0..store.trace_count() {
            let (bad, marks) = (&mut self.bad, &mut self.bad_marks);
            for s in 0..store.trace(t).len() {
                let (door, to) = store.edge_at(t, s);
                let split = self.votes[door.index() * n + to.index()] != self.totals[door.index()];
                let crowded = i64::from(self.degrees[to.index()]) > budget;
                if split || crowded {
                    if s > 0 {
                        mark(bad, marks, Position::new(t, s));
                    }
                    mark(bad, marks, Position::new(t, s + 1));
                }
            }
            if self.misses[t] > 0 {
                store.label_misses(t, |arrival| {
                    if arrival > 1 {
                        mark(bad, marks, Position::new(t, arrival - 1));
                    }
                    mark(bad, marks, Position::new(t, arrival));
                });
            }
        }
    }
}

fn mark(bad: &mut Vec<Position>, marks: &mut [Vec<bool>], position: Position) {
    let slot = &mut marks[position.trace][position.step];
    if !*slot {
        *slot = true;
        bad.push(position);
    }
}

/// Doors of `from` with a positive staged vote toward `to`
#[inline]
fn staged_links(votes: &[i32], diff: &[i32], n: usize, from: Vertex, to: Vertex) -> i32 {
    let base = from.index() * DOOR_COUNT;
    (0..DOOR_COUNT)
        .filter(|d| {
            let slot = (base + d) * n + to.index();
            votes[slot] + diff[slot] > 0
        })
        .count() as i32
}

fn compare(counter: &'static str, committed: &[i32], rescan: &[i32]) -> Result<(), ScoreError> {
    match committed.iter().zip(rescan).position(|(a, b)| a != b) {
        Some(index) => Err(ScoreError::Drift {
            counter,
            index,
            committed: i64::from(committed[index]),
            rescan: i64::from(rescan[index]),
        }),
        None => Ok(()),
    }
}
