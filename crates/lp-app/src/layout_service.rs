//! Plot layout save and restore.

use std::path::Path;
use std::sync::Arc;

use lp_layout::{LATEST_VERSION, LoadedLayout, PlotLayoutDef, SubplotDef, TabDef, TraceDef};
use lp_spec::PlotSpec;
use lp_store::SignalStore;
use tracing::{info, warn};

use crate::error::AppResult;
use crate::layout::{PlotLayout, Subplot, Tab, Trace};
use crate::reproduce::Reproducer;

/// A trace that could not be restored.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceWarning {
    pub tab: usize,
    pub subplot: usize,
    pub trace: usize,
    /// Name of the trace's root spec.
    pub name: String,
    pub message: String,
}

impl std::fmt::Display for TraceWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "tab {} subplot {} trace {} ('{}'): {}",
            self.tab, self.subplot, self.trace, self.name, self.message
        )
    }
}

/// Outcome of a layout load. Skipped traces are listed in `warnings`.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub layout: PlotLayout,
    pub warnings: Vec<TraceWarning>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Describe `layout` for saving. Traces without a plot spec cannot be
/// reproduced and are left out.
pub fn layout_to_def(layout: &PlotLayout) -> PlotLayoutDef {
    let tabs = layout
        .tabs
        .iter()
        .map(|tab| TabDef {
            name: tab.name.clone(),
            subplots: tab
                .subplots
                .iter()
                .map(|subplot| SubplotDef {
                    y_range: subplot.y_range,
                    traces: subplot
                        .traces
                        .iter()
                        .filter_map(|trace| {
                            let Some(spec) = trace.signal.plot_spec() else {
                                warn!(name = trace.signal.name(), "trace has no plot spec, not saved");
                                return None;
                            };
                            Some(TraceDef {
                                plot_spec: spec.to_dict(),
                                color: trace.color.clone(),
                                width: trace.width,
                                hidden: trace.hidden,
                                display_name: trace.display_name.clone(),
                            })
                        })
                        .collect(),
                })
                .collect(),
        })
        .collect();
    PlotLayoutDef {
        version: LATEST_VERSION,
        saved_at: None,
        tabs,
    }
}

/// Save `layout` to `path` (`.yaml`, `.yml` or `.json`).
pub fn save_layout(path: &Path, layout: &PlotLayout) -> AppResult<()> {
    let mut def = layout_to_def(layout);
    def.saved_at = Some(chrono::Utc::now().to_rfc3339());
    lp_layout::save(path, &def)?;
    info!(path = %path.display(), traces = def.trace_count(), "saved layout");
    Ok(())
}

/// Load a layout file and rebuild every trace against `store`.
///
/// Only unreadable files or a broken outer structure fail. Traces that are
/// malformed in the file or cannot be reproduced are reported in the
/// returned [`LoadReport`] at their position in the file.
pub fn load_layout(
    path: &Path,
    store: &mut SignalStore,
    reproducer: &mut Reproducer<'_>,
) -> AppResult<LoadReport> {
    let loaded = lp_layout::load_lenient(path)?;
    for reset in &loaded.range_resets {
        warn!(
            tab = reset.tab,
            subplot = reset.subplot,
            "y range dropped, using auto-range: {}",
            reset.reason
        );
    }
    let report = restore_loaded(&loaded, store, reproducer);
    info!(
        path = %path.display(),
        traces = report.layout.trace_count(),
        skipped = report.warnings.len(),
        "loaded layout"
    );
    Ok(report)
}

/// Rebuild the valid traces of `loaded` and merge in the ones the file
/// reader already rejected.
pub fn restore_loaded(
    loaded: &LoadedLayout,
    store: &mut SignalStore,
    reproducer: &mut Reproducer<'_>,
) -> LoadReport {
    let mut report = restore_layout(&loaded.layout, store, reproducer);
    for warning in &mut report.warnings {
        warning.trace = loaded.file_index(warning.tab, warning.subplot, warning.trace);
    }
    for rejected in &loaded.rejected {
        let warning = TraceWarning {
            tab: rejected.tab,
            subplot: rejected.subplot,
            trace: rejected.trace,
            name: rejected.name.clone(),
            message: rejected.reason.clone(),
        };
        warn!("skipping trace: {warning}");
        report.warnings.push(warning);
    }
    report
        .warnings
        .sort_by_key(|w| (w.tab, w.subplot, w.trace));
    report
}

/// Rebuild traces of an already parsed layout. Tabs and subplots are kept
/// even when all of their traces fail.
pub fn restore_layout(
    def: &PlotLayoutDef,
    store: &mut SignalStore,
    reproducer: &mut Reproducer<'_>,
) -> LoadReport {
    let mut report = LoadReport::default();
    for (tab_index, tab_def) in def.tabs.iter().enumerate() {
        let mut tab = Tab::new(tab_def.name.clone());
        for (subplot_index, subplot_def) in tab_def.subplots.iter().enumerate() {
            let mut subplot = Subplot {
                y_range: subplot_def.y_range,
                traces: Vec::with_capacity(subplot_def.traces.len()),
            };
            for (trace_index, trace_def) in subplot_def.traces.iter().enumerate() {
                match restore_trace(trace_def, store, reproducer) {
                    Ok(trace) => subplot.traces.push(trace),
                    Err(message) => {
                        let warning = TraceWarning {
                            tab: tab_index,
                            subplot: subplot_index,
                            trace: trace_index,
                            name: trace_def.plot_spec.name.clone(),
                            message,
                        };
                        warn!("skipping trace: {warning}");
                        report.warnings.push(warning);
                    }
                }
            }
            tab.subplots.push(subplot);
        }
        report.layout.tabs.push(tab);
    }
    report
}

fn restore_trace(
    def: &TraceDef,
    store: &mut SignalStore,
    reproducer: &mut Reproducer<'_>,
) -> Result<Trace, String> {
    let spec = PlotSpec::from_dict(&def.plot_spec).map_err(|e| e.to_string())?;
    let signal = reproducer
        .reproduce(store, &Arc::new(spec))
        .map_err(|e| e.to_string())?;
    Ok(Trace {
        signal,
        color: def.color.clone(),
        width: def.width,
        hidden: def.hidden,
        display_name: def.display_name.clone(),
    })
}
