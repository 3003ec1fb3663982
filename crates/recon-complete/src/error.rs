//! Error types for layered tables and replay

use recon_trace::DoorKey;

/// Failures building or replaying a table
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompleteError {
    /// One orientation code per base door
    #[error("expected {expected} orientation codes, found {found}")]
    CodeCount { expected: usize, found: usize },

    /// Code the orientation does not define
    #[error("door {door}: orientation code {code} out of range")]
    CodeOutOfRange { door: DoorKey, code: u8 },

    /// Replay needs at least the start vertex
    #[error("door table has no vertices")]
    EmptyTable,
}
