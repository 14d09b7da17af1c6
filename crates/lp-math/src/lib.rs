//! lp-math: pure numeric transforms over sampled signals.
//!
//! Contains:
//! - params (operator kinds and typed parameter records)
//! - expr (infix expression parser and vectorized evaluator)
//! - calculus (differentiate, integrate)
//! - butterworth (IIR design, lfilter, filtfilt)
//! - running (running min/max, mean, median)
//! - operator (the `MathOperator` contract and built-ins)
//! - registry (operator lookup)

pub mod butterworth;
pub mod calculus;
pub mod error;
pub mod expr;
pub mod operator;
pub mod params;
pub mod registry;
pub mod running;

pub use error::{MathError, MathResult};
pub use expr::{Bindings, Expr};
pub use operator::{MathInput, MathOperator};
pub use params::{
    ExprParams, ExtremumType, FilterParams, FilterType, Operation, OperatorKind,
    RunningMinMaxParams, RunningWindowParams, WindowStat, window_ticks,
};
pub use registry::MathRegistry;
