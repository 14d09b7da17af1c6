//! lp-spec: self-describing provenance for plotted signals.
//!
//! A [`PlotSpec`] is a tree whose leaves name raw file variables and whose
//! inner nodes apply math operators to their children. [`PlotSpecDict`] is
//! the serialized form written into plot layouts.

pub mod dict;
pub mod error;
pub mod spec;

pub use dict::PlotSpecDict;
pub use error::{SpecError, SpecResult};
pub use spec::{PlotSpec, SourceType, SpecSource, Walk};
