//! lp-layout: canonical plot layout file format and validation.

pub mod lenient;
pub mod migrate;
pub mod schema;
pub mod validate;

use std::path::Path;

pub use lenient::{LoadedLayout, RangeReset, RejectedTrace, from_json_str_lenient, from_yaml_str_lenient, load_lenient};
pub use migrate::{LATEST_VERSION, migrate_to_latest};
pub use schema::*;
pub use validate::{ValidationError, is_hex_color, validate_layout};

pub type LayoutResult<T> = Result<T, LayoutError>;

#[derive(thiserror::Error, Debug)]
pub enum LayoutError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Migration error: {what}")]
    Migration { what: String },

    #[error("Unsupported layout format: {path} (expected .yaml, .yml or .json)")]
    UnsupportedFormat { path: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk encoding, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutFormat {
    Yaml,
    Json,
}

impl LayoutFormat {
    pub fn from_path(path: &Path) -> LayoutResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yaml" | "yml") => Ok(LayoutFormat::Yaml),
            Some("json") => Ok(LayoutFormat::Json),
            _ => Err(LayoutError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }
}

pub fn from_yaml_str(content: &str) -> LayoutResult<PlotLayoutDef> {
    let mut layout: PlotLayoutDef = serde_yaml::from_str(content)?;
    layout = migrate_to_latest(layout)?;
    validate_layout(&layout)?;
    Ok(layout)
}

pub fn to_yaml_string(layout: &PlotLayoutDef) -> LayoutResult<String> {
    validate_layout(layout)?;
    Ok(serde_yaml::to_string(layout)?)
}

pub fn from_json_str(content: &str) -> LayoutResult<PlotLayoutDef> {
    let mut layout: PlotLayoutDef = serde_json::from_str(content)?;
    layout = migrate_to_latest(layout)?;
    validate_layout(&layout)?;
    Ok(layout)
}

pub fn to_json_string(layout: &PlotLayoutDef) -> LayoutResult<String> {
    validate_layout(layout)?;
    Ok(serde_json::to_string_pretty(layout)?)
}

pub fn load_yaml(path: &Path) -> LayoutResult<PlotLayoutDef> {
    let content = std::fs::read_to_string(path)?;
    from_yaml_str(&content)
}

pub fn save_yaml(path: &Path, layout: &PlotLayoutDef) -> LayoutResult<()> {
    let content = to_yaml_string(layout)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &Path) -> LayoutResult<PlotLayoutDef> {
    let content = std::fs::read_to_string(path)?;
    from_json_str(&content)
}

pub fn save_json(path: &Path, layout: &PlotLayoutDef) -> LayoutResult<()> {
    let content = to_json_string(layout)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load using the encoding implied by the extension.
pub fn load(path: &Path) -> LayoutResult<PlotLayoutDef> {
    match LayoutFormat::from_path(path)? {
        LayoutFormat::Yaml => load_yaml(path),
        LayoutFormat::Json => load_json(path),
    }
}

/// Save using the encoding implied by the extension.
pub fn save(path: &Path, layout: &PlotLayoutDef) -> LayoutResult<()> {
    match LayoutFormat::from_path(path)? {
        LayoutFormat::Yaml => save_yaml(path, layout),
        LayoutFormat::Json => save_json(path, layout),
    }
}
