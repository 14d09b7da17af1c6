//! Trace-by-trace layout reading for restore.
//!
//! A layout is only rejected as a whole when its outer structure cannot be
//! read. Traces that fail to deserialize or validate are dropped and
//! reported with their position in the file; a bad `y_range` falls back to
//! auto-range.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::schema::{PlotLayoutDef, SubplotDef, TabDef, TraceDef};
use crate::validate::{ValidationError, validate_subplot, validate_trace};
use crate::{LATEST_VERSION, LayoutFormat, LayoutResult, migrate_to_latest};

/// A trace left out of a [`LoadedLayout`].
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedTrace {
    pub tab: usize,
    pub subplot: usize,
    /// Position within the subplot as written in the file.
    pub trace: usize,
    /// `plot_spec.name` when it could be read.
    pub name: String,
    pub reason: String,
}

/// A subplot whose `y_range` was dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeReset {
    pub tab: usize,
    pub subplot: usize,
    pub reason: String,
}

/// The readable part of a layout file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedLayout {
    /// Valid traces only, migrated to the latest version.
    pub layout: PlotLayoutDef,
    pub rejected: Vec<RejectedTrace>,
    pub range_resets: Vec<RangeReset>,
}

impl LoadedLayout {
    /// File position of the `trace`-th surviving trace of a subplot.
    pub fn file_index(&self, tab: usize, subplot: usize, trace: usize) -> usize {
        let mut index = trace;
        for rejected in &self.rejected {
            if rejected.tab == tab && rejected.subplot == subplot && rejected.trace <= index {
                index += 1;
            }
        }
        index
    }
}

#[derive(Deserialize)]
struct RawLayout {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    saved_at: Option<String>,
    #[serde(default)]
    tabs: Vec<RawTab>,
}

#[derive(Deserialize)]
struct RawTab {
    #[serde(default)]
    name: String,
    #[serde(default)]
    subplots: Vec<RawSubplot>,
}

#[derive(Deserialize)]
struct RawSubplot {
    #[serde(default)]
    y_range: Value,
    #[serde(default)]
    traces: Vec<Value>,
}

pub fn from_yaml_str_lenient(content: &str) -> LayoutResult<LoadedLayout> {
    let raw: RawLayout = serde_yaml::from_str(content)?;
    from_raw(raw)
}

pub fn from_json_str_lenient(content: &str) -> LayoutResult<LoadedLayout> {
    let raw: RawLayout = serde_json::from_str(content)?;
    from_raw(raw)
}

/// Read `path` keeping every trace that is valid on its own.
pub fn load_lenient(path: &Path) -> LayoutResult<LoadedLayout> {
    let format = LayoutFormat::from_path(path)?;
    let content = std::fs::read_to_string(path)?;
    match format {
        LayoutFormat::Yaml => from_yaml_str_lenient(&content),
        LayoutFormat::Json => from_json_str_lenient(&content),
    }
}

fn from_raw(raw: RawLayout) -> LayoutResult<LoadedLayout> {
    if raw.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: raw.version,
        }
        .into());
    }
    let mut rejected = Vec::new();
    let mut range_resets = Vec::new();
    let mut tabs = Vec::with_capacity(raw.tabs.len());
    for (t, raw_tab) in raw.tabs.into_iter().enumerate() {
        let mut subplots = Vec::with_capacity(raw_tab.subplots.len());
        for (s, raw_subplot) in raw_tab.subplots.into_iter().enumerate() {
            let context = format!("tabs[{t}].subplots[{s}]");
            let y_range = match read_y_range(raw_subplot.y_range, &context) {
                Ok(range) => range,
                Err(reason) => {
                    range_resets.push(RangeReset {
                        tab: t,
                        subplot: s,
                        reason,
                    });
                    None
                }
            };
            let mut traces = Vec::with_capacity(raw_subplot.traces.len());
            for (i, value) in raw_subplot.traces.into_iter().enumerate() {
                let name = spec_name(&value);
                match read_trace(value, &format!("{context}.traces[{i}]")) {
                    Ok(trace) => traces.push(trace),
                    Err(reason) => rejected.push(RejectedTrace {
                        tab: t,
                        subplot: s,
                        trace: i,
                        name,
                        reason,
                    }),
                }
            }
            subplots.push(SubplotDef { y_range, traces });
        }
        tabs.push(TabDef {
            name: raw_tab.name,
            subplots,
        });
    }
    let layout = migrate_to_latest(PlotLayoutDef {
        version: raw.version,
        saved_at: raw.saved_at,
        tabs,
    })?;
    Ok(LoadedLayout {
        layout,
        rejected,
        range_resets,
    })
}

fn read_y_range(value: Value, context: &str) -> Result<Option<[f64; 2]>, String> {
    let y_range: Option<[f64; 2]> =
        serde_json::from_value(value).map_err(|e| format!("{context}.y_range: {e}"))?;
    let subplot = SubplotDef {
        y_range,
        traces: Vec::new(),
    };
    validate_subplot(&subplot, context).map_err(|e| e.to_string())?;
    Ok(y_range)
}

fn read_trace(value: Value, context: &str) -> Result<TraceDef, String> {
    let trace: TraceDef = serde_json::from_value(value).map_err(|e| format!("{context}: {e}"))?;
    validate_trace(&trace, context).map_err(|e| e.to_string())?;
    Ok(trace)
}

fn spec_name(value: &Value) -> String {
    value
        .get("plot_spec")
        .and_then(|spec| spec.get("name"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
