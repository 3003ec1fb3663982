//! Error types for the diff-commit protocol

use crate::score::Score;

/// Scoring engine errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoreError {
    /// Only one changeset may be staged at a time
    #[error("a changeset is already staged")]
    AlreadyStaged,

    /// `commit` called without a staged changeset
    #[error("no changeset staged")]
    NothingStaged,

    /// A changeset names a vertex outside the engine's range
    #[error("changeset vertex {vertex} outside 0..{vertex_count}")]
    VertexOutOfRange { vertex: usize, vertex_count: usize },

    /// A changeset names a trace the engine was not built for
    #[error("changeset trace {trace} outside 0..{trace_count}")]
    TraceOutOfRange { trace: usize, trace_count: usize },

    /// Incremental counters disagree with a full rescan
    #[error("counter drift in {counter} at index {index}: committed {committed}, rescan {rescan}")]
    Drift {
        counter: &'static str,
        index: usize,
        committed: i64,
        rescan: i64,
    },

    /// Incremental score disagrees with a full rescan
    #[error("score drift: committed {committed}, rescan {rescan}")]
    ScoreDrift { committed: Score, rescan: Score },
}
