//! In-memory plot layout: tabs of stacked subplots holding traces.

use lp_core::SourceId;
use lp_store::Signal;

pub const DEFAULT_COLOR: &str = "#1f77b4";

/// A plotted signal and its styling.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub signal: Signal,
    /// `#RRGGBB`.
    pub color: String,
    pub width: u32,
    pub hidden: bool,
    pub display_name: Option<String>,
}

impl Trace {
    pub fn new(signal: Signal) -> Self {
        Self {
            signal,
            color: DEFAULT_COLOR.to_string(),
            width: 1,
            hidden: false,
            display_name: None,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// Legend text.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .unwrap_or_else(|| self.signal.name())
    }

    pub fn source_id(&self) -> &SourceId {
        self.signal.source_id()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subplot {
    /// `[ymin, ymax]`, or `None` for auto-range.
    pub y_range: Option<[f64; 2]>,
    pub traces: Vec<Trace>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tab {
    pub name: String,
    pub subplots: Vec<Subplot>,
}

impl Tab {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subplots: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotLayout {
    pub tabs: Vec<Tab>,
}

impl PlotLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn traces(&self) -> impl Iterator<Item = &Trace> {
        self.tabs
            .iter()
            .flat_map(|tab| tab.subplots.iter())
            .flat_map(|subplot| subplot.traces.iter())
    }

    pub fn traces_mut(&mut self) -> impl Iterator<Item = &mut Trace> {
        self.tabs
            .iter_mut()
            .flat_map(|tab| tab.subplots.iter_mut())
            .flat_map(|subplot| subplot.traces.iter_mut())
    }

    pub fn trace_count(&self) -> usize {
        self.traces().count()
    }

    /// Mutable subplot, growing the tab and subplot lists as needed.
    pub fn subplot_mut(&mut self, tab: usize, subplot: usize) -> &mut Subplot {
        while self.tabs.len() <= tab {
            let name = format!("Tab {}", self.tabs.len() + 1);
            self.tabs.push(Tab::new(name));
        }
        let subplots = &mut self.tabs[tab].subplots;
        if subplots.len() <= subplot {
            subplots.resize_with(subplot + 1, Subplot::default);
        }
        &mut subplots[subplot]
    }

    /// Remove every trace plotted from `source_id`; returns how many went.
    pub fn drop_source(&mut self, source_id: &SourceId) -> usize {
        let mut dropped = 0;
        for subplot in self.tabs.iter_mut().flat_map(|tab| tab.subplots.iter_mut()) {
            let before = subplot.traces.len();
            subplot.traces.retain(|trace| trace.source_id() != source_id);
            dropped += before - subplot.traces.len();
        }
        dropped
    }
}
