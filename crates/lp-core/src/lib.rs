//! lp-core: stable foundation for logplot.
//!
//! Contains:
//! - numeric (Real + tolerances + float helpers)
//! - ids (source and plot-spec identifiers)
//! - samples (integer/float sample columns)
//! - time (time-base helpers: sortedness, mean step, tick lookup)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod samples;
pub mod time;

pub use error::{CoreError, CoreResult};
pub use ids::{SourceId, SpecId};
pub use numeric::*;
pub use samples::Samples;
pub use time::{avg_dt, ensure_aligned, ensure_sorted, nearest_tick, shifted};
