//! Running-window statistics over tick windows.

use std::collections::VecDeque;

use crate::params::{ExtremumType, WindowStat};

/// Position of the output sample inside a window of `window` ticks.
///
/// Odd windows are centred; even windows lean one tick toward the future.
pub fn window_origin(window: usize) -> usize {
    window.div_ceil(2).saturating_sub(1)
}

/// Largest window that still changes the output of a signal of `n` samples.
///
/// Beyond `2n + 1` ticks every output window already covers the whole
/// signal plus its padding on both sides.
pub fn effective_window(window: usize, n: usize) -> usize {
    window.clamp(1, n.saturating_mul(2).saturating_add(1).max(1))
}

/// Running min or max with edge-extended boundaries.
///
/// Output `i` covers input ticks `i - origin ..= i - origin + window - 1`,
/// where out-of-range ticks repeat the nearest edge sample. Works on any
/// ordered sample type so integer columns stay integer.
pub fn running_extremum<T: Copy + PartialOrd>(x: &[T], window: usize, kind: ExtremumType) -> Vec<T> {
    let n = x.len();
    let window = effective_window(window, n);
    if n == 0 || window == 1 {
        return x.to_vec();
    }
    let origin = window_origin(window) as isize;
    let at = |k: isize| x[k.clamp(0, n as isize - 1) as usize];
    let dominates = |a: T, b: T| match kind {
        ExtremumType::Min => a <= b,
        ExtremumType::Max => a >= b,
    };

    // Monotonic deque of (virtual index, value) over the edge-extended signal.
    let mut deque: VecDeque<(isize, T)> = VecDeque::new();
    let mut out = Vec::with_capacity(n);
    let mut next = -origin;
    for i in 0..n as isize {
        let lo = i - origin;
        let hi = lo + window as isize - 1;
        while next <= hi {
            let v = at(next);
            while let Some(&(_, back)) = deque.back() {
                if dominates(v, back) {
                    deque.pop_back();
                } else {
                    break;
                }
            }
            deque.push_back((next, v));
            next += 1;
        }
        while let Some(&(k, _)) = deque.front() {
            if k < lo {
                deque.pop_front();
            } else {
                break;
            }
        }
        // The tick at `hi` is never evicted, so the front always exists.
        out.push(deque.front().map_or(x[i as usize], |&(_, v)| v));
    }
    out
}

/// Moving average matching a same-length convolution with a uniform kernel.
///
/// The kernel is `1 / window` over `window` ticks and samples outside the
/// signal count as zero, so windows longer than the signal still divide by
/// the full window.
pub fn running_mean(x: &[f64], window: usize) -> Vec<f64> {
    let n = x.len();
    if n == 0 {
        return Vec::new();
    }
    let w = window.max(1);
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0.0);
    let mut acc = 0.0;
    for v in x {
        acc += v;
        prefix.push(acc);
    }
    let shift = (w - 1) / 2;
    let scale = 1.0 / w as f64;
    (0..n)
        .map(|i| {
            // Kernel covers i + shift - (w - 1) ..= i + shift, clipped to the signal.
            let reach = i.saturating_add(shift);
            let hi = reach.min(n - 1);
            let lo = reach.saturating_sub(w - 1);
            (prefix[hi + 1] - prefix[lo]) * scale
        })
        .collect()
}

/// Median filter with zero padding. Even windows grow by one tick.
///
/// From `2n + 1` ticks on, zeros fill more than half of every window and
/// the output no longer depends on the window length.
pub fn running_median(x: &[f64], window: usize) -> Vec<f64> {
    let n = x.len();
    let w = odd_window(effective_window(window, n));
    let half = w / 2;
    let mut sorted: Vec<f64> = Vec::with_capacity(w);

    let value = |k: isize| -> f64 {
        if k < 0 || k >= n as isize {
            0.0
        } else {
            x[k as usize]
        }
    };
    let insert = |sorted: &mut Vec<f64>, v: f64| {
        let pos = sorted.partition_point(|&s| s.total_cmp(&v).is_lt());
        sorted.insert(pos, v);
    };
    let remove = |sorted: &mut Vec<f64>, v: f64| {
        let pos = sorted.partition_point(|&s| s.total_cmp(&v).is_lt());
        sorted.remove(pos);
    };

    let mut out = Vec::with_capacity(n);
    for k in -(half as isize)..=(half as isize) {
        insert(&mut sorted, value(k));
    }
    for i in 0..n as isize {
        out.push(sorted[half]);
        remove(&mut sorted, value(i - half as isize));
        insert(&mut sorted, value(i + half as isize + 1));
    }
    out
}

/// Smallest odd window ≥ `window` (and ≥ 1).
pub fn odd_window(window: usize) -> usize {
    let w = window.max(1);
    if w % 2 == 0 { w + 1 } else { w }
}

/// Dispatch for [`WindowStat`].
pub fn running_stat(x: &[f64], window: usize, kind: WindowStat) -> Vec<f64> {
    match kind {
        WindowStat::Mean => running_mean(x, window),
        WindowStat::Median => running_median(x, window),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_max_three_ticks() {
        let x = [1.0, 3.0, 2.0, 5.0, 4.0];
        assert_eq!(
            running_extremum(&x, 3, ExtremumType::Max),
            vec![3.0, 3.0, 5.0, 5.0, 5.0]
        );
        assert_eq!(
            running_extremum(&x, 3, ExtremumType::Min),
            vec![1.0, 1.0, 2.0, 2.0, 4.0]
        );
    }

    #[test]
    fn even_window_leans_forward() {
        // origin = 1: output i covers i-1 ..= i+2
        let x = [1.0, 3.0, 2.0, 5.0, 4.0];
        assert_eq!(
            running_extremum(&x, 4, ExtremumType::Max),
            vec![3.0, 5.0, 5.0, 5.0, 5.0]
        );
        assert_eq!(window_origin(1), 0);
        assert_eq!(window_origin(2), 0);
        assert_eq!(window_origin(3), 1);
        assert_eq!(window_origin(4), 1);
        assert_eq!(window_origin(5), 2);
    }

    #[test]
    fn unit_window_is_identity() {
        let x = [4.0, -1.0, 7.5];
        assert_eq!(running_extremum(&x, 1, ExtremumType::Min), x.to_vec());
        assert_eq!(running_mean(&x, 1), x.to_vec());
        assert_eq!(running_median(&x, 1), x.to_vec());
    }

    #[test]
    fn mean_matches_same_convolution() {
        // convolve([1,2,3,4,5], ones(3)/3, 'same')
        let out = running_mean(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        let want = [1.0, 2.0, 3.0, 4.0, 3.0];
        for (o, w) in out.iter().zip(want) {
            assert!((o - w).abs() < 1e-12);
        }
        // even kernel: convolve([1,2,3,4], ones(2)/2, 'same') = [0.5, 1.5, 2.5, 3.5]
        let out = running_mean(&[1.0, 2.0, 3.0, 4.0], 2);
        let want = [0.5, 1.5, 2.5, 3.5];
        for (o, w) in out.iter().zip(want) {
            assert!((o - w).abs() < 1e-12);
        }
    }

    #[test]
    fn oversized_mean_window_divides_by_full_window() {
        // convolve([2,4], ones(10)/10, 'same') = [0.6, 0.6]
        let out = running_mean(&[2.0, 4.0], 10);
        assert_eq!(out.len(), 2);
        for o in out {
            assert!((o - 0.6).abs() < 1e-12);
        }
        let out = running_mean(&[1.0, 2.0, 3.0], 4);
        let want = [0.75, 1.5, 1.5];
        for (o, w) in out.iter().zip(want) {
            assert!((o - w).abs() < 1e-12);
        }
    }

    #[test]
    fn huge_windows_do_not_overflow() {
        let x = [1.0, 2.0, 3.0];
        assert_eq!(
            running_extremum(&x, usize::MAX, ExtremumType::Max),
            vec![3.0, 3.0, 3.0]
        );
        assert_eq!(
            running_extremum(&x, usize::MAX, ExtremumType::Min),
            vec![1.0, 1.0, 1.0]
        );
        assert_eq!(running_median(&x, usize::MAX), vec![0.0, 0.0, 0.0]);
        assert_eq!(running_median(&x, usize::MAX), running_median(&x, 7));
        assert!(running_mean(&x, usize::MAX).iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn integer_extremum_stays_integer() {
        let x = [4_i64, -2, 9, 7];
        assert_eq!(running_extremum(&x, 3, ExtremumType::Max), vec![4, 9, 9, 9]);
        assert_eq!(running_extremum(&x, 3, ExtremumType::Min), vec![-2, -2, -2, 7]);
    }

    #[test]
    fn median_zero_pads_and_forces_odd() {
        // medfilt([5,1,4,2,3], 3) = [1,4,2,3,2]
        assert_eq!(
            running_median(&[5.0, 1.0, 4.0, 2.0, 3.0], 3),
            vec![1.0, 4.0, 2.0, 3.0, 2.0]
        );
        assert_eq!(
            running_median(&[5.0, 1.0, 4.0, 2.0, 3.0], 2),
            running_median(&[5.0, 1.0, 4.0, 2.0, 3.0], 3)
        );
        assert_eq!(odd_window(0), 1);
        assert_eq!(odd_window(4), 5);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn extremum_bounds_input(x in prop::collection::vec(-1e6_f64..1e6, 1..80), w in 1_usize..20) {
            let lo = x.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mx = running_extremum(&x, w, ExtremumType::Max);
            let mn = running_extremum(&x, w, ExtremumType::Min);
            prop_assert_eq!(mx.len(), x.len());
            prop_assert_eq!(mn.len(), x.len());
            for i in 0..x.len() {
                prop_assert!(mx[i] >= x[i] && mx[i] <= hi);
                prop_assert!(mn[i] <= x[i] && mn[i] >= lo);
            }
        }

        #[test]
        fn window_stats_keep_length(x in prop::collection::vec(-1e3_f64..1e3, 0..80), w in 0_usize..30) {
            prop_assert_eq!(running_mean(&x, w).len(), x.len());
            prop_assert_eq!(running_median(&x, w).len(), x.len());
        }

        #[test]
        fn windows_past_twice_the_length_change_nothing(
            x in prop::collection::vec(-1e3_f64..1e3, 1..40),
            extra in 0_usize..1000,
        ) {
            let cap = 2 * x.len() + 1;
            prop_assert_eq!(running_median(&x, cap + extra), running_median(&x, cap));
            prop_assert_eq!(
                running_extremum(&x, cap + extra, ExtremumType::Max),
                running_extremum(&x, cap, ExtremumType::Max)
            );
        }
    }
}
