//! Error types for plot spec construction and decoding.

use lp_math::MathError;
use thiserror::Error;

pub type SpecResult<T> = Result<T, SpecError>;

#[derive(Debug, Error)]
pub enum SpecError {
    /// A field required by the node's `source_type` is missing or inconsistent.
    #[error("Malformed plot spec '{name}': {what}")]
    MalformedPlotSpec { name: String, what: String },

    /// Child count does not match the operator's arity.
    #[error("Arity mismatch for {operator} in '{name}': expected {expected} inputs, got {actual}")]
    ArityMismatch {
        name: String,
        operator: String,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Math(#[from] MathError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SpecError {
    pub(crate) fn malformed(name: impl Into<String>, what: impl Into<String>) -> Self {
        Self::MalformedPlotSpec {
            name: name.into(),
            what: what.into(),
        }
    }
}
