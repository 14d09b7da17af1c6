//! A signal store, the plot layout drawn from it, and a shared reproducer.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use lp_core::SourceId;
use lp_math::{MathRegistry, Operation};
use lp_store::{
    DelimitedTextLoader, EventKind, RawTable, Signal, SignalStore, SourceLoader, StoreEvent,
};
use tracing::{debug, info};

use crate::derive::derive_signal;
use crate::error::{AppError, AppResult};
use crate::layout::{PlotLayout, Trace};
use crate::layout_service::{self, LoadReport};
use crate::reproduce::Reproducer;

/// Traces are dropped from the layout when their source closes.
pub struct Session<'r> {
    store: SignalStore,
    layout: Rc<RefCell<PlotLayout>>,
    reproducer: Reproducer<'r>,
}

impl Session<'static> {
    pub fn new() -> Self {
        Self::with_registry(MathRegistry::global())
    }
}

impl Default for Session<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> Session<'r> {
    pub fn with_registry(registry: &'r MathRegistry) -> Self {
        let mut store = SignalStore::new();
        let layout = Rc::new(RefCell::new(PlotLayout::new()));
        let on_close = Rc::clone(&layout);
        store.subscribe(EventKind::Closed, move |event| {
            if let StoreEvent::Closed { source_id, .. } = event {
                let dropped = on_close.borrow_mut().drop_source(source_id);
                if dropped > 0 {
                    debug!(source = %source_id, dropped, "dropped traces of closed source");
                }
            }
        });
        Self {
            store,
            layout,
            reproducer: Reproducer::new(registry),
        }
    }

    pub fn store(&self) -> &SignalStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SignalStore {
        &mut self.store
    }

    pub fn reproducer(&self) -> &Reproducer<'r> {
        &self.reproducer
    }

    pub fn layout(&self) -> std::cell::Ref<'_, PlotLayout> {
        self.layout.borrow()
    }

    pub fn layout_mut(&self) -> std::cell::RefMut<'_, PlotLayout> {
        self.layout.borrow_mut()
    }

    pub fn open_source(&mut self, table: RawTable) -> AppResult<()> {
        self.store.open(table)?;
        Ok(())
    }

    /// Load `path` with `loader` and open it under its file name.
    pub fn open_file(&mut self, path: &Path, loader: &impl SourceLoader) -> AppResult<()> {
        let table = loader.load(path).map_err(|source| AppError::SourceFileRead {
            path: path.to_path_buf(),
            source,
        })?;
        self.open_source(table)
    }

    /// [`open_file`](Self::open_file) with the default delimited-text loader.
    pub fn open_delimited(&mut self, path: &Path) -> AppResult<()> {
        self.open_file(path, &DelimitedTextLoader::new())
    }

    pub fn close_source(&mut self, source_id: &str) -> AppResult<()> {
        self.store.close(source_id)?;
        self.reproducer.forget_source(&SourceId::from(source_id));
        Ok(())
    }

    /// Shift a source in time and refresh the traces drawn from it.
    pub fn set_time_offset(&mut self, source_id: &str, offset: f64) -> AppResult<()> {
        self.store.set_time_offset(source_id, offset)?;
        let mut layout = self.layout.borrow_mut();
        for trace in layout
            .traces_mut()
            .filter(|trace| trace.source_id().as_str() == source_id)
        {
            let fresh = self.store.get(source_id, trace.signal.name())?;
            let spec = trace.signal.plot_spec().cloned();
            trace.signal = fresh.with_plot_spec(spec);
        }
        Ok(())
    }

    /// Plot a store variable into `tab`/`subplot`.
    pub fn add_trace(
        &mut self,
        tab: usize,
        subplot: usize,
        source_id: &str,
        name: &str,
    ) -> AppResult<Signal> {
        let signal = self.store.get(source_id, name)?;
        self.layout
            .borrow_mut()
            .subplot_mut(tab, subplot)
            .traces
            .push(Trace::new(signal.clone()));
        Ok(signal)
    }

    /// Create a derived signal from store variables.
    pub fn derive(
        &mut self,
        name: &str,
        operation: Operation,
        inputs: &[(&str, &str)],
    ) -> AppResult<Signal> {
        let inputs = inputs
            .iter()
            .map(|(source_id, var)| self.store.get(source_id, var))
            .collect::<Result<Vec<_>, _>>()?;
        derive_signal(
            &mut self.store,
            &mut self.reproducer,
            name,
            operation,
            &inputs,
        )
    }

    pub fn save_layout(&self, path: &Path) -> AppResult<()> {
        layout_service::save_layout(path, &self.layout.borrow())
    }

    /// Replace the current layout with the one in `path`.
    pub fn load_layout(&mut self, path: &Path) -> AppResult<Vec<layout_service::TraceWarning>> {
        let LoadReport { layout, warnings } =
            layout_service::load_layout(path, &mut self.store, &mut self.reproducer)?;
        info!(
            traces = layout.trace_count(),
            warnings = warnings.len(),
            "session layout replaced"
        );
        *self.layout.borrow_mut() = layout;
        Ok(warnings)
    }
}
