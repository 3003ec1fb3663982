//! Error types for trace construction and input parsing

use crate::types::{DoorKey, Position, Vertex};

/// Errors raised while assembling traces or a [`crate::TraceStore`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Label sequence must be one longer than the door sequence
    #[error("trace has {doors} doors but {labels} labels (expected doors + 1)")]
    LabelLength { doors: usize, labels: usize },

    /// One override slot per door
    #[error("trace has {doors} doors but {overrides} override slots")]
    OverrideLength { doors: usize, overrides: usize },

    /// Door digit outside `0..DOOR_COUNT`
    #[error("door {0} out of range")]
    DoorOutOfRange(u8),

    /// Label digit outside `0..LABEL_COUNT`
    #[error("label {0} out of range")]
    LabelOutOfRange(u8),

    /// Vertex count must fit the `u16` vertex space and be non-zero
    #[error("vertex count {0} out of range")]
    VertexCount(usize),

    /// Hypothesis names a vertex outside `0..vertex_count`
    #[error("vertex {vertex} at {position} out of range")]
    VertexOutOfRange { position: Position, vertex: Vertex },

    /// Hypothesis array length must be `trace.len() + 1`
    #[error("trace {trace}: hypothesis length {found}, expected {expected}")]
    HypothesisLength {
        trace: usize,
        expected: usize,
        found: usize,
    },

    /// Trace index outside the store
    #[error("trace index {0} out of range")]
    UnknownTrace(usize),

    /// Orientation code the layering does not define
    #[error("door {door}: orientation code {code} out of range")]
    CodeOutOfRange { door: DoorKey, code: u8 },

    /// A layered instance needs the same number of rooms in every layer
    #[error("{vertex_count} rooms do not split into {layers} layers")]
    LayerSplit { vertex_count: usize, layers: usize },
}

/// Errors raised by [`crate::parse_input`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Input ended early
    #[error("missing {0}")]
    MissingToken(&'static str),

    /// Count token is not a number
    #[error("invalid {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    /// Door or label character out of range
    #[error("trace {trace}, column {column}: unexpected {found:?}")]
    InvalidDigit {
        trace: usize,
        column: usize,
        found: char,
    },

    /// A `[` marker not followed by `<digit>]`
    #[error("trace {trace}, column {column}: malformed label override")]
    UnclosedOverride { trace: usize, column: usize },

    /// Label string length disagrees with the door string
    #[error("trace {trace}: expected {expected} labels, found {found}")]
    LengthMismatch {
        trace: usize,
        expected: usize,
        found: usize,
    },

    /// Tokens after the last label string
    #[error("unexpected trailing input: {0:?}")]
    TrailingInput(String),

    /// Parsed traces failed validation
    #[error(transparent)]
    Store(#[from] StoreError),
}
