//! lp-store: raw and derived variables of every open source.
//!
//! Contains:
//! - loader (raw tables, the `SourceLoader` trait, delimited text logs)
//! - model (one `DataModel` per source, single shared time base)
//! - signal (read-only signal views)
//! - store (`SignalStore` operations)
//! - events (observer registry)
//! - drag (drag payloads naming a variable)

pub mod drag;
pub mod error;
pub mod events;
pub mod loader;
pub mod model;
pub mod signal;
pub mod store;

pub use drag::DragPayload;
pub use error::{StoreError, StoreResult};
pub use events::{EventKind, StoreEvent, SubscriptionHandle};
pub use loader::{Delimiter, DelimitedTextLoader, RawTable, SourceLoader};
pub use model::DataModel;
pub use signal::Signal;
pub use store::SignalStore;
