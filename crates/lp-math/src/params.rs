//! Operator kinds and their parameter records.
//!
//! On disk the parameters live in a free-form `operation_details` map next
//! to a `source_type` tag. In memory every operator gets a typed record so a
//! spec can only carry parameters that make sense for its kind.

use serde::{Deserialize, Serialize};

use crate::error::{MathError, MathResult};
use crate::expr::Expr;

/// One entry per implemented math operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperatorKind {
    Expr,
    Filter,
    Diff,
    Integrate,
    RunningMinMax,
    RunningWindow,
}

impl OperatorKind {
    pub const ALL: [OperatorKind; 6] = [
        OperatorKind::Expr,
        OperatorKind::Filter,
        OperatorKind::Diff,
        OperatorKind::Integrate,
        OperatorKind::RunningMinMax,
        OperatorKind::RunningWindow,
    ];

    /// Tag written to the `source_type` field of a saved spec.
    pub fn source_type(self) -> &'static str {
        match self {
            OperatorKind::Expr => "math_expr",
            OperatorKind::Filter => "math_filter",
            OperatorKind::Diff => "math_diff",
            OperatorKind::Integrate => "math_integrate",
            OperatorKind::RunningMinMax => "math_running_minmax",
            OperatorKind::RunningWindow => "math_running_window",
        }
    }

    pub fn from_source_type(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.source_type() == tag)
    }
}

impl std::fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.source_type())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Low,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtremumType {
    Min,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowStat {
    Mean,
    Median,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprParams {
    pub expression: String,
}

/// Butterworth filter design parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    pub order: u32,
    #[serde(rename = "type")]
    pub kind: FilterType,
    /// Cutoff frequency in Hz.
    pub cutoff: f64,
    #[serde(default)]
    pub filtfilt: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningMinMaxParams {
    #[serde(rename = "type")]
    pub kind: ExtremumType,
    /// Window length, in ticks when `is_ticks` is set, otherwise in seconds.
    pub window_sz: f64,
    #[serde(default)]
    pub is_ticks: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunningWindowParams {
    #[serde(rename = "type")]
    pub kind: WindowStat,
    /// Window length, in ticks when `is_ticks` is set, otherwise in seconds.
    pub window_sz: f64,
    #[serde(default)]
    pub is_ticks: bool,
}

/// Typed parameter record for one operator application.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Expr(ExprParams),
    Filter(FilterParams),
    Diff,
    Integrate,
    RunningMinMax(RunningMinMaxParams),
    RunningWindow(RunningWindowParams),
}

impl Operation {
    pub fn expr(expression: impl Into<String>) -> Self {
        Operation::Expr(ExprParams {
            expression: expression.into(),
        })
    }

    pub fn kind(&self) -> OperatorKind {
        match self {
            Operation::Expr(_) => OperatorKind::Expr,
            Operation::Filter(_) => OperatorKind::Filter,
            Operation::Diff => OperatorKind::Diff,
            Operation::Integrate => OperatorKind::Integrate,
            Operation::RunningMinMax(_) => OperatorKind::RunningMinMax,
            Operation::RunningWindow(_) => OperatorKind::RunningWindow,
        }
    }

    /// Number of inputs this operation consumes.
    ///
    /// Expressions take one input per distinct variable; everything else is unary.
    pub fn arity(&self) -> MathResult<usize> {
        match self {
            Operation::Expr(p) => Ok(Expr::parse(&p.expression)?.arity()),
            _ => Ok(1),
        }
    }

    /// Decode a saved `operation_details` map for `kind`.
    pub fn from_details(
        kind: OperatorKind,
        details: Option<&serde_json::Value>,
    ) -> MathResult<Self> {
        fn decode<T: serde::de::DeserializeOwned>(
            kind: OperatorKind,
            details: Option<&serde_json::Value>,
        ) -> MathResult<T> {
            let value = details.ok_or_else(|| {
                MathError::invalid(format!("{kind} requires operation_details"))
            })?;
            T::deserialize(value)
                .map_err(|e| MathError::invalid(format!("{kind} operation_details: {e}")))
        }

        let op = match kind {
            OperatorKind::Expr => Operation::Expr(decode(kind, details)?),
            OperatorKind::Filter => Operation::Filter(decode(kind, details)?),
            OperatorKind::Diff => Operation::Diff,
            OperatorKind::Integrate => Operation::Integrate,
            OperatorKind::RunningMinMax => Operation::RunningMinMax(decode(kind, details)?),
            OperatorKind::RunningWindow => Operation::RunningWindow(decode(kind, details)?),
        };
        Ok(op)
    }

    /// Encode as an `operation_details` map. Parameterless operators have none.
    pub fn to_details(&self) -> Option<serde_json::Value> {
        let value = match self {
            Operation::Expr(p) => serde_json::to_value(p),
            Operation::Filter(p) => serde_json::to_value(p),
            Operation::Diff | Operation::Integrate => return None,
            Operation::RunningMinMax(p) => serde_json::to_value(p),
            Operation::RunningWindow(p) => serde_json::to_value(p),
        };
        value.ok()
    }

    /// Range checks that do not depend on the input data.
    pub fn validate(&self) -> MathResult<()> {
        match self {
            Operation::Expr(p) => {
                Expr::parse(&p.expression)?;
            }
            Operation::Filter(p) => {
                if p.order == 0 {
                    return Err(MathError::invalid("filter order must be at least 1"));
                }
                if !p.cutoff.is_finite() || p.cutoff <= 0.0 {
                    return Err(MathError::invalid(format!(
                        "filter cutoff must be positive, got {}",
                        p.cutoff
                    )));
                }
            }
            Operation::RunningMinMax(RunningMinMaxParams { window_sz, .. })
            | Operation::RunningWindow(RunningWindowParams { window_sz, .. }) => {
                if !window_sz.is_finite() {
                    return Err(MathError::invalid(format!(
                        "window_sz must be finite, got {window_sz}"
                    )));
                }
            }
            Operation::Diff | Operation::Integrate => {}
        }
        Ok(())
    }

    /// Short human-readable description for legends and CLI output.
    pub fn describe(&self) -> String {
        match self {
            Operation::Expr(p) => p.expression.clone(),
            Operation::Filter(p) => {
                let band = match p.kind {
                    FilterType::Low => "LP",
                    FilterType::High => "HP",
                };
                let mode = if p.filtfilt { ", filtfilt" } else { "" };
                format!("{band} fc={:.3} Hz (order {}{mode})", p.cutoff, p.order)
            }
            Operation::Diff => "d/dt".to_string(),
            Operation::Integrate => "∫ dt".to_string(),
            Operation::RunningMinMax(p) => {
                let mm = match p.kind {
                    ExtremumType::Min => "min",
                    ExtremumType::Max => "max",
                };
                format!("running {mm} over {}", window_label(p.window_sz, p.is_ticks))
            }
            Operation::RunningWindow(p) => {
                let stat = match p.kind {
                    WindowStat::Mean => "mean",
                    WindowStat::Median => "median",
                };
                format!("running {stat} over {}", window_label(p.window_sz, p.is_ticks))
            }
        }
    }
}

fn window_label(window_sz: f64, is_ticks: bool) -> String {
    if is_ticks {
        format!("{window_sz} ticks")
    } else {
        format!("{window_sz} s")
    }
}

/// Convert a window parameter into a tick count ≥ 1.
///
/// Time windows are divided by the mean sample step and rounded; tick
/// windows are truncated toward zero.
pub fn window_ticks(window_sz: f64, is_ticks: bool, avg_dt: f64) -> MathResult<usize> {
    if !window_sz.is_finite() {
        return Err(MathError::invalid(format!(
            "window_sz must be finite, got {window_sz}"
        )));
    }
    let ticks = if is_ticks {
        window_sz.trunc()
    } else {
        if !(avg_dt > 0.0) {
            return Err(MathError::InvalidTimeBase { avg_dt });
        }
        (window_sz / avg_dt).round()
    };
    Ok(if ticks < 1.0 { 1 } else { ticks as usize })
}
