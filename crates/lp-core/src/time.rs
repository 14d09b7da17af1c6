//! Time-base helpers shared by the store and the math operators.

use crate::{CoreError, CoreResult};

/// Mean of the first differences of `time`.
///
/// Returns 0.0 for fewer than two samples; callers that divide by the
/// step treat a non-positive value as an invalid time base.
pub fn avg_dt(time: &[f64]) -> f64 {
    if time.len() < 2 {
        return 0.0;
    }
    let sum: f64 = time.windows(2).map(|w| w[1] - w[0]).sum();
    sum / (time.len() - 1) as f64
}

/// Check that `time` is monotonically non-decreasing.
pub fn ensure_sorted(time: &[f64]) -> CoreResult<()> {
    for (i, w) in time.windows(2).enumerate() {
        if !(w[1] >= w[0]) {
            return Err(CoreError::UnsortedTime {
                index: i + 1,
                prev: w[0],
                next: w[1],
            });
        }
    }
    Ok(())
}

/// Check that a data column has one sample per timestamp.
pub fn ensure_aligned(what: &str, data_len: usize, time_len: usize) -> CoreResult<()> {
    if data_len != time_len {
        return Err(CoreError::LengthMismatch {
            what: what.to_string(),
            expected: time_len,
            actual: data_len,
        });
    }
    Ok(())
}

/// `time + offset`, freshly allocated.
pub fn shifted(time: &[f64], offset: f64) -> Vec<f64> {
    time.iter().map(|t| t + offset).collect()
}

/// Tick whose time is closest to `t`. `None` for an empty time base.
pub fn nearest_tick(time: &[f64], t: f64) -> Option<usize> {
    if time.is_empty() {
        return None;
    }
    let idx = time.partition_point(|&x| x < t);
    if idx == 0 {
        return Some(0);
    }
    if idx >= time.len() {
        return Some(time.len() - 1);
    }
    if (t - time[idx - 1]) <= (time[idx] - t) {
        Some(idx - 1)
    } else {
        Some(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avg_dt_uniform() {
        let t = [0.0, 0.1, 0.2, 0.3];
        assert!((avg_dt(&t) - 0.1).abs() < 1e-12);
        assert_eq!(avg_dt(&[1.0]), 0.0);
        assert_eq!(avg_dt(&[]), 0.0);
    }

    #[test]
    fn sortedness() {
        assert!(ensure_sorted(&[0.0, 0.0, 1.0]).is_ok());
        let err = ensure_sorted(&[0.0, 2.0, 1.0]).unwrap_err();
        assert!(matches!(err, CoreError::UnsortedTime { index: 2, .. }));
        assert!(ensure_sorted(&[0.0, f64::NAN]).is_err());
    }

    #[test]
    fn nearest_tick_edges() {
        let t = [0.0, 1.0, 2.0, 3.0];
        assert_eq!(nearest_tick(&t, -5.0), Some(0));
        assert_eq!(nearest_tick(&t, 1.4), Some(1));
        assert_eq!(nearest_tick(&t, 1.6), Some(2));
        assert_eq!(nearest_tick(&t, 9.0), Some(3));
        assert_eq!(nearest_tick(&[], 0.0), None);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn shifted_preserves_order(mut t in prop::collection::vec(-1e3_f64..1e3, 0..50), off in -1e3_f64..1e3) {
            t.sort_by(|a, b| a.total_cmp(b));
            let s = shifted(&t, off);
            prop_assert_eq!(s.len(), t.len());
            prop_assert!(ensure_sorted(&s).is_ok());
        }
    }
}
