//! The signal store: every open source, its variables, and notifications.

use std::sync::Arc;

use lp_core::{Samples, SourceId, ensure_finite};
use lp_spec::PlotSpec;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::events::{Callback, EventKind, Observers, StoreEvent, SubscriptionHandle};
use crate::loader::RawTable;
use crate::model::DataModel;
use crate::signal::Signal;

/// Owner of all open [`DataModel`]s, in open order.
#[derive(Debug, Default)]
pub struct SignalStore {
    models: Vec<DataModel>,
    observers: Observers,
}

impl SignalStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, source_id: &str) -> Option<usize> {
        self.models
            .iter()
            .position(|m| m.source_id().as_str() == source_id)
    }

    fn missing(source_id: &str) -> StoreError {
        StoreError::SourceMissing {
            source_id: SourceId::from(source_id),
        }
    }

    fn model_mut(&mut self, source_id: &str) -> StoreResult<&mut DataModel> {
        let index = self
            .position(source_id)
            .ok_or_else(|| Self::missing(source_id))?;
        Ok(&mut self.models[index])
    }

    /// Register `table` under its `source_id`.
    pub fn open(&mut self, table: RawTable) -> StoreResult<&DataModel> {
        if self.position(table.source_id.as_str()).is_some() {
            return Err(StoreError::DuplicateSource {
                source_id: table.source_id,
            });
        }
        let model = DataModel::from_table(table)?;
        info!(
            source = %model.source_id(),
            samples = model.len(),
            variables = model.variable_names().count(),
            "opened source"
        );
        self.models.push(model);
        let index = self.models.len() - 1;
        let model = &self.models[index];
        self.observers.emit(&StoreEvent::SourceOpened {
            source_id: model.source_id(),
        });
        Ok(model)
    }

    /// Notify `on_close` observers, then release the model.
    pub fn close(&mut self, source_id: impl AsRef<str>) -> StoreResult<()> {
        let source_id = source_id.as_ref();
        let index = self
            .position(source_id)
            .ok_or_else(|| Self::missing(source_id))?;
        let model = self.models.remove(index);
        self.observers.emit(&StoreEvent::Closed {
            source_id: model.source_id(),
            model: &model,
        });
        info!(source = %model.source_id(), "closed source");
        Ok(())
    }

    pub fn contains(&self, source_id: impl AsRef<str>) -> bool {
        self.position(source_id.as_ref()).is_some()
    }

    pub fn sources(&self) -> impl Iterator<Item = &SourceId> {
        self.models.iter().map(DataModel::source_id)
    }

    pub fn model(&self, source_id: impl AsRef<str>) -> StoreResult<&DataModel> {
        let source_id = source_id.as_ref();
        self.position(source_id)
            .map(|i| &self.models[i])
            .ok_or_else(|| Self::missing(source_id))
    }

    pub fn variable_names(&self, source_id: impl AsRef<str>) -> StoreResult<Vec<&str>> {
        Ok(self.model(source_id)?.variable_names().collect())
    }

    /// Raw or derived variable; its time reflects the current offset.
    pub fn get(&self, source_id: impl AsRef<str>, name: &str) -> StoreResult<Signal> {
        self.model(source_id)?.get(name)
    }

    /// Add a derived variable on the source's time base.
    pub fn add_derived(
        &mut self,
        source_id: impl AsRef<str>,
        name: impl Into<String>,
        data: impl Into<Samples>,
    ) -> StoreResult<Signal> {
        self.add_derived_signal(source_id, name, data, None)
    }

    /// [`add_derived`](Self::add_derived) that also records the producing spec.
    pub fn add_derived_signal(
        &mut self,
        source_id: impl AsRef<str>,
        name: impl Into<String>,
        data: impl Into<Samples>,
        plot_spec: Option<Arc<PlotSpec>>,
    ) -> StoreResult<Signal> {
        let model = self.model_mut(source_id.as_ref())?;
        let signal = model.insert_derived(name.into(), data.into(), plot_spec)?;
        debug!(source = %signal.source_id(), name = signal.name(), "added derived signal");
        self.observers.emit(&StoreEvent::SignalAdded {
            source_id: signal.source_id(),
            name: signal.name(),
        });
        Ok(signal)
    }

    /// Like [`add_derived_signal`](Self::add_derived_signal), but a taken
    /// name gets a ` (2)`, ` (3)`, … suffix. The returned signal carries the
    /// final name.
    pub fn add_derived_unique(
        &mut self,
        source_id: impl AsRef<str>,
        name: &str,
        data: impl Into<Samples>,
        plot_spec: Option<Arc<PlotSpec>>,
    ) -> StoreResult<Signal> {
        let source_id = source_id.as_ref();
        let unique = self.model(source_id)?.unique_name(name);
        if unique != name {
            debug!(source = source_id, requested = name, assigned = %unique, "renamed derived signal");
        }
        self.add_derived_signal(source_id, unique, data, plot_spec)
    }

    pub fn remove_derived(&mut self, source_id: impl AsRef<str>, name: &str) -> StoreResult<()> {
        let model = self.model_mut(source_id.as_ref())?;
        model.remove_derived(name)?;
        let source_id = model.source_id().clone();
        self.observers.emit(&StoreEvent::SignalRemoved {
            source_id: &source_id,
            name,
        });
        Ok(())
    }

    /// Shift the effective time of every variable in the source.
    pub fn set_time_offset(&mut self, source_id: impl AsRef<str>, offset: f64) -> StoreResult<()> {
        let offset = ensure_finite(offset, "time offset")?;
        let model = self.model_mut(source_id.as_ref())?;
        model.set_time_offset(offset);
        let source_id = model.source_id().clone();
        debug!(source = %source_id, offset, "time offset changed");
        self.observers
            .emit(&StoreEvent::TimeChanged { source_id: &source_id, offset });
        Ok(())
    }

    pub fn subscribe(
        &mut self,
        kind: EventKind,
        callback: impl FnMut(&StoreEvent<'_>) + 'static,
    ) -> SubscriptionHandle {
        let callback: Callback = Box::new(callback);
        self.observers.subscribe(kind, callback)
    }

    /// Returns false if the handle was not subscribed.
    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) -> bool {
        self.observers.unsubscribe(handle)
    }

    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn engine() -> RawTable {
        RawTable::new("Engine.csv", vec![0.0, 0.1, 0.2])
            .with_column("a", vec![1_i64, 2, 3])
            .with_column("b", vec![10.0, 20.0, 30.0])
    }

    #[test]
    fn open_rejects_duplicates() {
        let mut store = SignalStore::new();
        store.open(engine()).unwrap();
        assert!(matches!(
            store.open(engine()),
            Err(StoreError::DuplicateSource { .. })
        ));
        assert_eq!(store.sources().count(), 1);
    }

    #[test]
    fn get_errors() {
        let mut store = SignalStore::new();
        store.open(engine()).unwrap();
        assert!(matches!(
            store.get("Trans.log", "a"),
            Err(StoreError::SourceMissing { .. })
        ));
        assert!(matches!(
            store.get("Engine.csv", "zz"),
            Err(StoreError::VariableMissing { .. })
        ));
    }

    #[test]
    fn derived_signals_share_time_and_clash_on_name() {
        let mut store = SignalStore::new();
        store.open(engine()).unwrap();
        let d = store.add_derived("Engine.csv", "c", vec![0.5, 0.6, 0.7]).unwrap();
        assert_eq!(d.base_time(), store.get("Engine.csv", "a").unwrap().base_time());
        assert!(store.get("Engine.csv", "c").is_ok());
        assert!(matches!(
            store.add_derived("Engine.csv", "a", vec![0.0; 3]),
            Err(StoreError::NameClash { .. })
        ));
        assert!(matches!(
            store.add_derived("Engine.csv", "d", vec![0.0; 2]),
            Err(StoreError::LengthMismatch { .. })
        ));
        let renamed = store
            .add_derived_unique("Engine.csv", "c", vec![1.0; 3], None)
            .unwrap();
        assert_eq!(renamed.name(), "c (2)");
        store.remove_derived("Engine.csv", "c").unwrap();
        assert!(!store.model("Engine.csv").unwrap().contains("c"));
        assert!(store.remove_derived("Engine.csv", "a").is_err());
    }

    #[test]
    fn events_fire_in_order() {
        let log = Rc::new(RefCell::new(Vec::<String>::new()));
        let mut store = SignalStore::new();
        for kind in [
            EventKind::SourceOpened,
            EventKind::SignalAdded,
            EventKind::TimeChanged,
            EventKind::Closed,
        ] {
            let log = Rc::clone(&log);
            store.subscribe(kind, move |event| {
                let entry = match event {
                    StoreEvent::SourceOpened { source_id } => format!("open {source_id}"),
                    StoreEvent::SignalAdded { name, .. } => format!("added {name}"),
                    StoreEvent::TimeChanged { offset, .. } => format!("offset {offset}"),
                    StoreEvent::Closed { model, .. } => {
                        format!("close {}", model.variable_names().count())
                    }
                    StoreEvent::SignalRemoved { name, .. } => format!("removed {name}"),
                };
                log.borrow_mut().push(entry);
            });
        }
        store.open(engine()).unwrap();
        store.add_derived("Engine.csv", "c", vec![0.0; 3]).unwrap();
        store.set_time_offset("Engine.csv", 2.5).unwrap();
        store.close("Engine.csv").unwrap();
        assert_eq!(
            *log.borrow(),
            ["open Engine.csv", "added c", "offset 2.5", "close 3"]
        );
        assert!(!store.contains("Engine.csv"));
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let count = Rc::new(RefCell::new(0));
        let mut store = SignalStore::new();
        let handle = {
            let count = Rc::clone(&count);
            store.subscribe(EventKind::SourceOpened, move |_| *count.borrow_mut() += 1)
        };
        store.open(engine()).unwrap();
        assert!(store.unsubscribe(handle));
        assert!(!store.unsubscribe(handle));
        store
            .open(RawTable::new("Trans.log", vec![0.0]).with_column("gear", vec![1_i64]))
            .unwrap();
        assert_eq!(*count.borrow(), 1);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn offset_must_be_finite() {
        let mut store = SignalStore::new();
        store.open(engine()).unwrap();
        assert!(store.set_time_offset("Engine.csv", f64::NAN).is_err());
        assert!(matches!(
            store.set_time_offset("Nope", 1.0),
            Err(StoreError::SourceMissing { .. })
        ));
    }
}
