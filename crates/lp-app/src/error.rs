//! Error types for the lp-app service layer.

use std::path::PathBuf;

use crate::reproduce::ReproduceError;

/// Unified error for CLI and embedding front ends.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(#[from] lp_store::StoreError),

    #[error("Plot spec error: {0}")]
    Spec(#[from] lp_spec::SpecError),

    #[error("Math error: {0}")]
    Math(#[from] lp_math::MathError),

    #[error("Layout error: {0}")]
    Layout(#[from] lp_layout::LayoutError),

    #[error("Reproduction failed: {0}")]
    Reproduce(#[from] ReproduceError),

    #[error("Failed to read source file: {path}")]
    SourceFileRead {
        path: PathBuf,
        source: lp_store::StoreError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for lp-app operations.
pub type AppResult<T> = Result<T, AppError>;
