//! Plot layout schema definitions.

use lp_spec::PlotSpecDict;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlotLayoutDef {
    #[serde(default)]
    pub version: u32,
    /// RFC 3339 timestamp written on save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<String>,
    #[serde(default)]
    pub tabs: Vec<TabDef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TabDef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subplots: Vec<SubplotDef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SubplotDef {
    /// `[ymin, ymax]`, or `None` for auto-range.
    #[serde(default)]
    pub y_range: Option<[f64; 2]>,
    #[serde(default)]
    pub traces: Vec<TraceDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceDef {
    pub plot_spec: PlotSpecDict,
    /// `#RRGGBB`.
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub display_name: Option<String>,
}

fn default_color() -> String {
    "#1f77b4".to_string()
}

fn default_width() -> u32 {
    1
}

impl PlotLayoutDef {
    pub fn traces(&self) -> impl Iterator<Item = &TraceDef> {
        self.tabs
            .iter()
            .flat_map(|tab| tab.subplots.iter())
            .flat_map(|subplot| subplot.traces.iter())
    }

    pub fn trace_count(&self) -> usize {
        self.traces().count()
    }
}
