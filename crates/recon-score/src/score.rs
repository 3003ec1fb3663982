//! Score values and scoring parameters

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::ops::{Add, AddAssign};

/// Scoring parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    /// Multiplier applied to pairwise door conflicts
    pub conflict_weight: f64,
    /// Degree aggregate a vertex may reach without penalty
    pub degree_budget: u32,
    /// Multiplier applied to replayed label mismatches
    pub mismatch_weight: f64,
}

impl ScoreConfig {
    /// Defaults
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the conflict weight
    #[inline]
    #[must_use]
    pub fn with_conflict_weight(mut self, weight: f64) -> Self {
        self.conflict_weight = weight;
        self
    }

    /// Set the per-vertex door budget
    #[inline]
    #[must_use]
    pub fn with_degree_budget(mut self, budget: u32) -> Self {
        self.degree_budget = budget;
        self
    }

    /// Set the label-mismatch weight
    #[inline]
    #[must_use]
    pub fn with_mismatch_weight(mut self, weight: f64) -> Self {
        self.mismatch_weight = weight;
        self
    }
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            conflict_weight: 0.1,
            degree_budget: recon_trace::DOOR_COUNT as u32,
            mismatch_weight: 1.0,
        }
    }
}

/// Committed score, kept as exact integer components
///
/// - `conflict`: `Σ_door Σ_w votes[w] * (total - votes[w])`
/// - `excess`: `Σ_v max(0, degree[v] - budget)`
/// - `mismatch`: arrivals whose replayed label disagrees with the
///   observation, summed over traces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Score {
    /// Pairwise disagreement of door votes
    pub conflict: i64,
    /// Degree aggregate over budget, summed
    pub excess: i64,
    /// Replayed label mismatches, summed
    pub mismatch: i64,
}

impl Score {
    /// Weighted scalar used by the acceptance test
    #[inline]
    #[must_use]
    pub fn value(self, config: &ScoreConfig) -> f64 {
        weighted(self.conflict, self.excess, self.mismatch, config)
    }

    /// No contradictions remain
    #[inline]
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.conflict == 0 && self.excess == 0 && self.mismatch == 0
    }
}

impl Display for Score {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "conflict={} excess={} mismatch={}",
            self.conflict, self.excess, self.mismatch
        )
    }
}

/// Signed change of a [`Score`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScoreDelta {
    /// Change in pairwise door-vote disagreement
    pub conflict: i64,
    /// Change in degree excess
    pub excess: i64,
    /// Change in replayed label mismatches
    pub mismatch: i64,
}

impl ScoreDelta {
    /// Weighted scalar, same weights as [`Score::value`]
    #[inline]
    #[must_use]
    pub fn value(self, config: &ScoreConfig) -> f64 {
        weighted(self.conflict, self.excess, self.mismatch, config)
    }

    /// Every component is zero
    #[inline]
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.conflict == 0 && self.excess == 0 && self.mismatch == 0
    }
}

#[inline]
fn weighted(conflict: i64, excess: i64, mismatch: i64, config: &ScoreConfig) -> f64 {
    conflict as f64 * config.conflict_weight + excess as f64 + mismatch as f64 * config.mismatch_weight
}

impl Add<ScoreDelta> for Score {
    type Output = Score;

    fn add(self, delta: ScoreDelta) -> Score {
        Score {
            conflict: self.conflict + delta.conflict,
            excess: self.excess + delta.excess,
            mismatch: self.mismatch + delta.mismatch,
        }
    }
}

impl AddAssign<ScoreDelta> for Score {
    fn add_assign(&mut self, delta: ScoreDelta) {
        *self = *self + delta;
    }
}
