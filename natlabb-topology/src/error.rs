//! Validation errors surfaced by the topology codec.

use thiserror::Error;

/// Errors raised while decoding or validating a topology document.
///
/// These are caller errors by definition: the retry controller never
/// consumes an attempt on them.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Malformed topology payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate node id '{0}'")]
    DuplicateNode(String),

    #[error("Edge {from} -> {target} references unknown node '{missing}'")]
    DanglingEdge {
        from: String,
        target: String,
        missing: String,
    },

    #[error("{field} on edge {from} -> {target} is {value}, expected 0..=100")]
    PercentageOutOfRange {
        field: &'static str,
        from: String,
        target: String,
        value: f64,
    },
}
