//! Shared application service layer for logplot.
//!
//! This crate provides a unified interface for the CLI and embedding
//! front ends: rebuilding signals from plot specs, deriving new signals,
//! tracking the plot layout of a session, and saving or restoring it.

pub mod derive;
pub mod error;
pub mod layout;
pub mod layout_service;
pub mod query;
pub mod reproduce;
pub mod session;

// Re-export key types for convenience
pub use derive::derive_signal;
pub use error::{AppError, AppResult};
pub use layout::{PlotLayout, Subplot, Tab, Trace};
pub use layout_service::{
    LoadReport, TraceWarning, layout_to_def, load_layout, restore_layout, restore_loaded, save_layout,
};
pub use query::{SignalSummary, SourceSummary, list_sources, sample_at, signal_summary, source_summary};
pub use reproduce::{ReproduceError, ReproduceResult, Reproducer};
pub use session::Session;
