//! Discrete differentiation and integration over a sample time base.

use lp_core::ensure_aligned;

use crate::error::MathResult;

fn check_lengths(x: &[f64], t: &[f64]) -> MathResult<()> {
    Ok(ensure_aligned("signal", x.len(), t.len())?)
}

/// Backward difference quotient with `y[0] = 0`.
///
/// Repeated timestamps divide by zero and yield IEEE infinities/NaN.
pub fn differentiate(x: &[f64], t: &[f64]) -> MathResult<Vec<f64>> {
    check_lengths(x, t)?;
    let mut out = Vec::with_capacity(x.len());
    if x.is_empty() {
        return Ok(out);
    }
    out.push(0.0);
    for i in 1..x.len() {
        out.push((x[i] - x[i - 1]) / (t[i] - t[i - 1]));
    }
    Ok(out)
}

/// Rectangle-rule running integral: cumulative sum of `x[i] * dt[i]`, `dt[0] = 0`.
pub fn integrate(x: &[f64], t: &[f64]) -> MathResult<Vec<f64>> {
    check_lengths(x, t)?;
    let mut out = Vec::with_capacity(x.len());
    let mut acc = 0.0;
    for i in 0..x.len() {
        if i > 0 {
            acc += x[i] * (t[i] - t[i - 1]);
        }
        out.push(acc);
    }
    Ok(out)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn time_base() -> impl Strategy<Value = Vec<f64>> {
        prop::collection::vec(0.001_f64..1.0, 1..64).prop_map(|steps| {
            let mut t = Vec::with_capacity(steps.len());
            let mut acc = 0.0;
            for s in steps {
                t.push(acc);
                acc += s;
            }
            t
        })
    }

    proptest! {
        #[test]
        fn integrate_undoes_differentiate(
            (t, x) in time_base().prop_flat_map(|t| {
                let n = t.len();
                (Just(t), prop::collection::vec(-100.0_f64..100.0, n))
            })
        ) {
            let d = differentiate(&x, &t).unwrap();
            let back = integrate(&d, &t).unwrap();
            prop_assert_eq!(back.len(), x.len());
            for i in 0..x.len() {
                let want = x[i] - x[0];
                prop_assert!((back[i] - want).abs() <= 1e-6 * (1.0 + want.abs()),
                    "i={} got {} want {}", i, back[i], want);
            }
        }
    }
}
