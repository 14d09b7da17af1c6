//! Signal store errors.

use lp_core::{CoreError, SourceId};
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Source already open: {source_id}")]
    DuplicateSource { source_id: SourceId },

    #[error("Source not open: {source_id}")]
    SourceMissing { source_id: SourceId },

    #[error("Variable '{name}' not found in {source_id}")]
    VariableMissing { source_id: SourceId, name: String },

    #[error("Variable '{name}' already exists in {source_id}")]
    NameClash { source_id: SourceId, name: String },

    #[error("Length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("Time vector of {source_id} is not sorted at tick {index}")]
    UnsortedTime { source_id: SourceId, index: usize },

    #[error("Parse error at line {line}: {what}")]
    Parse { line: usize, what: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}
