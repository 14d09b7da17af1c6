//! Layout validation logic.

use crate::schema::{PlotLayoutDef, SubplotDef, TraceDef};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_layout(layout: &PlotLayoutDef) -> Result<(), ValidationError> {
    if layout.version > crate::migrate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: layout.version,
        });
    }
    for (t, tab) in layout.tabs.iter().enumerate() {
        for (s, subplot) in tab.subplots.iter().enumerate() {
            let context = format!("tabs[{t}].subplots[{s}]");
            validate_subplot(subplot, &context)?;
            for (i, trace) in subplot.traces.iter().enumerate() {
                validate_trace(trace, &format!("{context}.traces[{i}]"))?;
            }
        }
    }
    Ok(())
}

pub(crate) fn validate_subplot(subplot: &SubplotDef, context: &str) -> Result<(), ValidationError> {
    if let Some([lo, hi]) = subplot.y_range {
        if !lo.is_finite() || !hi.is_finite() || lo > hi {
            return Err(ValidationError::InvalidValue {
                field: format!("{context}.y_range"),
                value: format!("[{lo}, {hi}]"),
                reason: "must be finite with ymin <= ymax".to_string(),
            });
        }
    }
    Ok(())
}

pub(crate) fn validate_trace(trace: &TraceDef, context: &str) -> Result<(), ValidationError> {
    if !is_hex_color(&trace.color) {
        return Err(ValidationError::InvalidValue {
            field: format!("{context}.color"),
            value: trace.color.clone(),
            reason: "expected #RRGGBB".to_string(),
        });
    }
    Ok(())
}

pub fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}
