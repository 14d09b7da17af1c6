//! The operator contract and the built-in operators.

use lp_core::{Samples, avg_dt};

use crate::error::{MathError, MathResult};
use crate::expr::{Bindings, Expr};
use crate::params::{Operation, OperatorKind, window_ticks};
use crate::{butterworth, calculus, running};

/// One input sequence together with the time base it is sampled on.
#[derive(Debug, Clone, Copy)]
pub struct MathInput<'a> {
    pub data: &'a Samples,
    pub time: &'a [f64],
}

impl<'a> MathInput<'a> {
    pub fn new(data: &'a Samples, time: &'a [f64]) -> Self {
        Self { data, time }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A pure transform from input sequences to one output sequence.
///
/// Implementations must not retain or mutate inputs. The output has the
/// length of the first input. Selection operators may keep integer samples
/// integer; everything else produces floats.
pub trait MathOperator: Send + Sync {
    fn kind(&self) -> OperatorKind;

    fn apply(&self, inputs: &[MathInput<'_>], op: &Operation) -> MathResult<Samples>;
}

/// Checks shared by every operator: matching kind, arity, aligned lengths.
pub fn check_inputs(
    kind: OperatorKind,
    inputs: &[MathInput<'_>],
    op: &Operation,
) -> MathResult<()> {
    if op.kind() != kind {
        return Err(wrong_parameters(kind, op));
    }
    let expected = op.arity()?;
    if inputs.len() != expected {
        return Err(MathError::ArityMismatch {
            operator: kind.source_type().to_string(),
            expected,
            actual: inputs.len(),
        });
    }
    for input in inputs {
        if input.data.len() != input.time.len() {
            return Err(MathError::LengthMismatch {
                expected: input.time.len(),
                actual: input.data.len(),
            });
        }
    }
    if let Some(first) = inputs.first() {
        for input in &inputs[1..] {
            if input.len() != first.len() {
                return Err(MathError::LengthMismatch {
                    expected: first.len(),
                    actual: input.len(),
                });
            }
        }
    }
    Ok(())
}

fn wrong_parameters(kind: OperatorKind, op: &Operation) -> MathError {
    MathError::invalid(format!("{kind} cannot run {} parameters", op.kind()))
}

fn positive_dt(time: &[f64]) -> MathResult<f64> {
    let dt = avg_dt(time);
    if dt > 0.0 {
        Ok(dt)
    } else {
        Err(MathError::InvalidTimeBase { avg_dt: dt })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ExprOperator;

impl MathOperator for ExprOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Expr
    }

    fn apply(&self, inputs: &[MathInput<'_>], op: &Operation) -> MathResult<Samples> {
        check_inputs(self.kind(), inputs, op)?;
        let Operation::Expr(params) = op else {
            return Err(wrong_parameters(self.kind(), op));
        };
        let expr = Expr::parse(&params.expression)?;
        let widened: Vec<_> = inputs.iter().map(|i| i.data.as_f64()).collect();
        let mut bindings = Bindings::new();
        for (name, slot) in input_slots(expr.variables()) {
            bindings.insert(name.clone(), &widened[slot][..]);
        }
        expr.evaluate(&bindings).map(Samples::Float)
    }
}

/// Input index for each expression variable.
///
/// When the variables are exactly `x0..x{n-1}`, `xk` reads input `k`
/// wherever it appears in the text. Any other naming binds by first
/// occurrence.
pub fn input_slots(variables: &[String]) -> Vec<(&String, usize)> {
    let indexed: Option<Vec<usize>> = variables
        .iter()
        .map(|v| v.strip_prefix('x').and_then(|k| k.parse::<usize>().ok()))
        .collect();
    if let Some(indices) = indexed {
        let mut sorted = indices.clone();
        sorted.sort_unstable();
        if sorted.iter().copied().eq(0..variables.len()) {
            return variables.iter().zip(indices).collect();
        }
    }
    variables.iter().zip(0..).collect()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FilterOperator;

impl MathOperator for FilterOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Filter
    }

    fn apply(&self, inputs: &[MathInput<'_>], op: &Operation) -> MathResult<Samples> {
        check_inputs(self.kind(), inputs, op)?;
        let Operation::Filter(params) = op else {
            return Err(wrong_parameters(self.kind(), op));
        };
        let input = inputs[0];
        if input.is_empty() {
            return Ok(Samples::Float(Vec::new()));
        }
        let dt = positive_dt(input.time)?;
        butterworth::apply(&input.data.as_f64(), dt, params).map(Samples::Float)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DiffOperator;

impl MathOperator for DiffOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Diff
    }

    fn apply(&self, inputs: &[MathInput<'_>], op: &Operation) -> MathResult<Samples> {
        check_inputs(self.kind(), inputs, op)?;
        calculus::differentiate(&inputs[0].data.as_f64(), inputs[0].time).map(Samples::Float)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IntegrateOperator;

impl MathOperator for IntegrateOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Integrate
    }

    fn apply(&self, inputs: &[MathInput<'_>], op: &Operation) -> MathResult<Samples> {
        check_inputs(self.kind(), inputs, op)?;
        calculus::integrate(&inputs[0].data.as_f64(), inputs[0].time).map(Samples::Float)
    }
}

/// Resolve a window parameter against the input's mean step.
///
/// Tick windows never look at the time base, so constant or single-sample
/// time vectors are fine for them.
fn resolve_window(window_sz: f64, is_ticks: bool, time: &[f64]) -> MathResult<usize> {
    if is_ticks {
        window_ticks(window_sz, true, 0.0)
    } else {
        window_ticks(window_sz, false, positive_dt(time)?)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RunningMinMaxOperator;

impl MathOperator for RunningMinMaxOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::RunningMinMax
    }

    fn apply(&self, inputs: &[MathInput<'_>], op: &Operation) -> MathResult<Samples> {
        check_inputs(self.kind(), inputs, op)?;
        let Operation::RunningMinMax(params) = op else {
            return Err(wrong_parameters(self.kind(), op));
        };
        let input = inputs[0];
        let window = resolve_window(params.window_sz, params.is_ticks, input.time)?;
        Ok(match input.data {
            Samples::Int(values) => {
                Samples::Int(running::running_extremum(&values[..], window, params.kind))
            }
            Samples::Float(values) => {
                Samples::Float(running::running_extremum(&values[..], window, params.kind))
            }
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RunningWindowOperator;

impl MathOperator for RunningWindowOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::RunningWindow
    }

    fn apply(&self, inputs: &[MathInput<'_>], op: &Operation) -> MathResult<Samples> {
        check_inputs(self.kind(), inputs, op)?;
        let Operation::RunningWindow(params) = op else {
            return Err(wrong_parameters(self.kind(), op));
        };
        let input = inputs[0];
        let window = resolve_window(params.window_sz, params.is_ticks, input.time)?;
        Ok(Samples::Float(running::running_stat(
            &input.data.as_f64(),
            window,
            params.kind,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{
        ExtremumType, FilterParams, FilterType, RunningMinMaxParams, RunningWindowParams,
        WindowStat,
    };

    #[test]
    fn indexed_variables_bind_by_index() {
        let t = [0.0, 0.1, 0.2];
        let a = Samples::from(vec![1_i64, 2, 3]);
        let b = Samples::from(vec![10.0, 20.0, 30.0]);
        let inputs = [MathInput::new(&a, &t), MathInput::new(&b, &t)];
        let out = ExprOperator
            .apply(&inputs, &Operation::expr("x1 - x0"))
            .unwrap();
        assert_eq!(out, Samples::Float(vec![9.0, 18.0, 27.0]));
    }

    #[test]
    fn free_names_bind_by_first_occurrence() {
        let t = [0.0, 0.1];
        let a = Samples::from(vec![1.0, 2.0]);
        let b = Samples::from(vec![10.0, 20.0]);
        let inputs = [MathInput::new(&a, &t), MathInput::new(&b, &t)];
        let out = ExprOperator
            .apply(&inputs, &Operation::expr("speed - base"))
            .unwrap();
        assert_eq!(out, Samples::Float(vec![-9.0, -18.0]));

        let names = ["x1".to_string(), "x3".to_string()];
        let slots: Vec<usize> = input_slots(&names).into_iter().map(|(_, k)| k).collect();
        assert_eq!(slots, vec![0, 1]);
    }

    #[test]
    fn arity_is_enforced() {
        let t = [0.0, 1.0];
        let a = Samples::from(vec![1.0, 2.0]);
        let err = DiffOperator
            .apply(&[MathInput::new(&a, &t), MathInput::new(&a, &t)], &Operation::Diff)
            .unwrap_err();
        assert!(matches!(
            err,
            MathError::ArityMismatch {
                expected: 1,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn misaligned_inputs_are_rejected() {
        let t2 = [0.0, 1.0];
        let t3 = [0.0, 1.0, 2.0];
        let a = Samples::from(vec![1.0, 2.0]);
        let b = Samples::from(vec![1.0, 2.0, 3.0]);
        let err = ExprOperator
            .apply(
                &[MathInput::new(&a, &t2), MathInput::new(&b, &t3)],
                &Operation::expr("x0 + x1"),
            )
            .unwrap_err();
        assert!(matches!(err, MathError::LengthMismatch { .. }));
    }

    #[test]
    fn filter_needs_positive_step() {
        let t = [1.0, 1.0, 1.0];
        let x = Samples::from(vec![1.0, 2.0, 3.0]);
        let op = Operation::Filter(FilterParams {
            order: 1,
            kind: FilterType::Low,
            cutoff: 1.0,
            filtfilt: false,
        });
        let err = FilterOperator
            .apply(&[MathInput::new(&x, &t)], &op)
            .unwrap_err();
        assert!(matches!(err, MathError::InvalidTimeBase { .. }));
    }

    #[test]
    fn tick_windows_ignore_time_base() {
        let t = [0.0, 0.0, 0.0];
        let x = Samples::from(vec![3.0, 1.0, 2.0]);
        let op = Operation::RunningMinMax(RunningMinMaxParams {
            kind: ExtremumType::Min,
            window_sz: 1.0,
            is_ticks: true,
        });
        let out = RunningMinMaxOperator
            .apply(&[MathInput::new(&x, &t)], &op)
            .unwrap();
        assert_eq!(out, Samples::Float(vec![3.0, 1.0, 2.0]));

        let seconds = Operation::RunningWindow(RunningWindowParams {
            kind: WindowStat::Mean,
            window_sz: 1.0,
            is_ticks: false,
        });
        assert!(matches!(
            RunningWindowOperator.apply(&[MathInput::new(&x, &t)], &seconds),
            Err(MathError::InvalidTimeBase { .. })
        ));
    }

    #[test]
    fn integer_min_max_stays_integer() {
        let t = [0.0, 1.0, 2.0, 3.0];
        let gear = Samples::from(vec![1_i64, 3, 2, 4]);
        let op = Operation::RunningMinMax(RunningMinMaxParams {
            kind: ExtremumType::Max,
            window_sz: 2.0,
            is_ticks: false,
        });
        let out = RunningMinMaxOperator
            .apply(&[MathInput::new(&gear, &t)], &op)
            .unwrap();
        assert_eq!(out, Samples::Int(vec![3, 3, 4, 4]));

        let mean = Operation::RunningWindow(RunningWindowParams {
            kind: WindowStat::Mean,
            window_sz: 1.0,
            is_ticks: true,
        });
        let out = RunningWindowOperator
            .apply(&[MathInput::new(&gear, &t)], &mean)
            .unwrap();
        assert!(!out.is_integer());
    }

    #[test]
    fn huge_tick_window_from_details() {
        let t = [0.0, 1.0, 2.0];
        let x = Samples::from(vec![1.0, 2.0, 3.0]);
        let op = Operation::RunningWindow(RunningWindowParams {
            kind: WindowStat::Median,
            window_sz: 1e300,
            is_ticks: true,
        });
        let out = RunningWindowOperator
            .apply(&[MathInput::new(&x, &t)], &op)
            .unwrap();
        assert_eq!(out, Samples::Float(vec![0.0, 0.0, 0.0]));
    }

    #[test]
    fn wrong_parameters_for_kind() {
        let t = [0.0, 1.0];
        let x = Samples::from(vec![1.0, 2.0]);
        let err = IntegrateOperator
            .apply(&[MathInput::new(&x, &t)], &Operation::Diff)
            .unwrap_err();
        assert!(matches!(err, MathError::InvalidParameter { .. }));
    }
}
