//! Error types for math operators and the expression evaluator.

use thiserror::Error;

/// Result type for math operations.
pub type MathResult<T> = Result<T, MathError>;

/// Errors raised by operators, parameter decoding and expression evaluation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MathError {
    /// No operator registered for this source type.
    #[error("Unknown operator: {source_type}")]
    UnknownOperator { source_type: String },

    /// Operator needs a positive mean sample step.
    #[error("Invalid time base: average dt is {avg_dt}")]
    InvalidTimeBase { avg_dt: f64 },

    /// Wrong number of inputs for the operator.
    #[error("Arity mismatch for {operator}: expected {expected} inputs, got {actual}")]
    ArityMismatch {
        operator: String,
        expected: usize,
        actual: usize,
    },

    /// Inputs (or bound variables) differ in length.
    #[error("Length mismatch: expected {expected} samples, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Parameter record is missing, malformed, or out of range.
    #[error("Invalid parameter: {what}")]
    InvalidParameter { what: String },

    /// Expression references a variable with no binding.
    #[error("Unbound variable: {name}")]
    UnboundVariable { name: String },

    /// Real-domain violation while evaluating an expression.
    #[error("Arithmetic failure: {what}")]
    ArithmeticFailure { what: String },

    /// Expression text could not be parsed.
    #[error("Parse error at {position}: {what}")]
    Parse { position: usize, what: String },
}

impl MathError {
    pub(crate) fn invalid(what: impl Into<String>) -> Self {
        Self::InvalidParameter { what: what.into() }
    }
}

impl From<lp_core::CoreError> for MathError {
    fn from(err: lp_core::CoreError) -> Self {
        match err {
            lp_core::CoreError::LengthMismatch {
                expected, actual, ..
            } => MathError::LengthMismatch { expected, actual },
            other => MathError::InvalidParameter {
                what: other.to_string(),
            },
        }
    }
}
