//! Drag payloads name a variable; they never carry sample data.

use lp_core::SourceId;

use crate::error::StoreResult;
use crate::signal::Signal;
use crate::store::SignalStore;

const SEPARATOR: char = '\u{1f}';

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DragPayload {
    pub source_id: SourceId,
    pub variable_name: String,
}

impl DragPayload {
    pub fn new(source_id: impl Into<SourceId>, variable_name: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            variable_name: variable_name.into(),
        }
    }

    /// Single-string form for mime channels: `source_id`, unit separator, name.
    pub fn encode(&self) -> String {
        format!("{}{SEPARATOR}{}", self.source_id, self.variable_name)
    }

    pub fn decode(text: &str) -> Option<Self> {
        let (source, name) = text.split_once(SEPARATOR)?;
        if source.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(source, name))
    }

    /// Fetch the current signal from the store.
    pub fn resolve(&self, store: &SignalStore) -> StoreResult<Signal> {
        store.get(&self.source_id, &self.variable_name)
    }
}
