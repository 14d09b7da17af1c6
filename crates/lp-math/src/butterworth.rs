//! Digital Butterworth design and IIR filtering.
//!
//! Design follows the classic analog-prototype route: poles of the order-N
//! Butterworth prototype, frequency transform to low/high pass at the
//! pre-warped cutoff, bilinear transform, then expansion to transfer
//! function coefficients. Filtering uses direct form II transposed;
//! `filtfilt` runs it forward and backward over an odd-extended signal
//! with steady-state initial conditions.

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::error::{MathError, MathResult};
use crate::params::{FilterParams, FilterType};

/// Transfer function coefficients, highest power first, `a[0] == 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferFunction {
    pub b: Vec<f64>,
    pub a: Vec<f64>,
}

/// Design an order-`order` digital Butterworth filter.
///
/// `wn` is the cutoff normalized to the Nyquist frequency, `0 < wn < 1`.
pub fn design(order: u32, wn: f64, kind: FilterType) -> MathResult<TransferFunction> {
    if order == 0 {
        return Err(MathError::invalid("filter order must be at least 1"));
    }
    if !(wn > 0.0 && wn < 1.0) {
        return Err(MathError::invalid(format!(
            "normalized cutoff must satisfy 0 < Wn < 1, got {wn}"
        )));
    }

    let n = order as i32;
    let prototype: Vec<Complex64> = (0..n)
        .map(|i| {
            let m = -n + 1 + 2 * i;
            -Complex64::from_polar(1.0, PI * m as f64 / (2.0 * n as f64))
        })
        .collect();

    // Bilinear transform with fs = 2, pre-warped cutoff.
    let fs = 2.0;
    let warped = 2.0 * fs * (PI * wn / fs).tan();

    let (zeros, poles, gain) = match kind {
        FilterType::Low => {
            let poles: Vec<Complex64> = prototype.iter().map(|p| *p * warped).collect();
            (Vec::new(), poles, warped.powi(n))
        }
        FilterType::High => {
            let poles: Vec<Complex64> = prototype.iter().map(|p| warped / *p).collect();
            let prod_neg_p = prototype
                .iter()
                .fold(Complex64::new(1.0, 0.0), |acc, p| acc * -*p);
            let gain = (Complex64::new(1.0, 0.0) / prod_neg_p).re;
            (vec![Complex64::new(0.0, 0.0); n as usize], poles, gain)
        }
    };

    let (zd, pd, kd) = bilinear_zpk(&zeros, &poles, gain, fs);
    let b: Vec<f64> = poly(&zd).iter().map(|c| (*c * kd).re).collect();
    let a: Vec<f64> = poly(&pd).iter().map(|c| c.re).collect();
    Ok(TransferFunction { b, a })
}

fn bilinear_zpk(
    zeros: &[Complex64],
    poles: &[Complex64],
    gain: f64,
    fs: f64,
) -> (Vec<Complex64>, Vec<Complex64>, f64) {
    let fs2 = Complex64::new(2.0 * fs, 0.0);
    let mut zd: Vec<Complex64> = zeros.iter().map(|z| (fs2 + *z) / (fs2 - *z)).collect();
    let pd: Vec<Complex64> = poles.iter().map(|p| (fs2 + *p) / (fs2 - *p)).collect();
    // Zeros at infinity map to Nyquist.
    zd.extend(std::iter::repeat_n(
        Complex64::new(-1.0, 0.0),
        poles.len() - zeros.len(),
    ));
    let num = zeros
        .iter()
        .fold(Complex64::new(1.0, 0.0), |acc, z| acc * (fs2 - *z));
    let den = poles
        .iter()
        .fold(Complex64::new(1.0, 0.0), |acc, p| acc * (fs2 - *p));
    (zd, pd, gain * (num / den).re)
}

/// Monic polynomial with the given roots, highest power first.
fn poly(roots: &[Complex64]) -> Vec<Complex64> {
    let mut coeffs = vec![Complex64::new(1.0, 0.0)];
    for r in roots {
        let mut next = coeffs.clone();
        next.push(Complex64::new(0.0, 0.0));
        for i in 1..next.len() {
            next[i] -= *r * coeffs[i - 1];
        }
        coeffs = next;
    }
    coeffs
}

/// Pad `b` and `a` to a common length and normalize by `a[0]`.
fn normalized(tf: &TransferFunction) -> MathResult<(Vec<f64>, Vec<f64>)> {
    let a0 = tf.a.first().copied().unwrap_or(0.0);
    if a0 == 0.0 || tf.b.is_empty() {
        return Err(MathError::invalid("degenerate transfer function"));
    }
    let n = tf.a.len().max(tf.b.len());
    let mut b = tf.b.clone();
    let mut a = tf.a.clone();
    b.resize(n, 0.0);
    a.resize(n, 0.0);
    b.iter_mut().for_each(|v| *v /= a0);
    a.iter_mut().for_each(|v| *v /= a0);
    Ok((b, a))
}

/// Direct form II transposed IIR filter.
///
/// `zi` holds the initial delay-line state (length `max(len(a), len(b)) - 1`);
/// `None` starts from rest. Returns the output and the final state.
pub fn lfilter(
    tf: &TransferFunction,
    x: &[f64],
    zi: Option<&[f64]>,
) -> MathResult<(Vec<f64>, Vec<f64>)> {
    let (b, a) = normalized(tf)?;
    let n = b.len();
    let mut z = match zi {
        Some(zi) if zi.len() != n - 1 => {
            return Err(MathError::LengthMismatch {
                expected: n - 1,
                actual: zi.len(),
            });
        }
        Some(zi) => zi.to_vec(),
        None => vec![0.0; n - 1],
    };

    let mut y = Vec::with_capacity(x.len());
    for &xi in x {
        let yi = b[0] * xi + z.first().copied().unwrap_or(0.0);
        for i in 0..n.saturating_sub(2) {
            z[i] = b[i + 1] * xi + z[i + 1] - a[i + 1] * yi;
        }
        if n > 1 {
            z[n - 2] = b[n - 1] * xi - a[n - 1] * yi;
        }
        y.push(yi);
    }
    Ok((y, z))
}

/// Initial state for a step response at steady state (unit input).
pub fn lfilter_zi(tf: &TransferFunction) -> MathResult<Vec<f64>> {
    let (b, a) = normalized(tf)?;
    let n = b.len();
    if n < 2 {
        return Ok(Vec::new());
    }
    // Solve zi = A zi + B for the companion-form state matrix.
    let a_sum: f64 = a.iter().sum();
    let b_vec: Vec<f64> = (1..n).map(|k| b[k] - a[k] * b[0]).collect();
    let mut zi = vec![0.0; n - 1];
    zi[0] = b_vec.iter().sum::<f64>() / a_sum;
    let mut asum = 1.0;
    let mut csum = 0.0;
    for k in 1..n - 1 {
        asum += a[k];
        csum += b[k] - a[k] * b[0];
        zi[k] = asum * zi[0] - csum;
    }
    Ok(zi)
}

/// Samples added on each side by [`filtfilt`].
pub fn filtfilt_padlen(tf: &TransferFunction) -> usize {
    3 * tf.a.len().max(tf.b.len())
}

/// Zero-phase forward/backward filtering.
///
/// The signal is extended by odd reflection about its end points so edge
/// transients are pushed outside the returned range.
pub fn filtfilt(tf: &TransferFunction, x: &[f64]) -> MathResult<Vec<f64>> {
    let edge = filtfilt_padlen(tf);
    if x.len() <= edge {
        return Err(MathError::invalid(format!(
            "filtfilt needs more than {edge} samples, got {}",
            x.len()
        )));
    }
    let n = x.len();
    let first = x[0];
    let last = x[n - 1];

    let mut ext = Vec::with_capacity(n + 2 * edge);
    ext.extend((0..edge).map(|i| 2.0 * first - x[edge - i]));
    ext.extend_from_slice(x);
    ext.extend((0..edge).map(|j| 2.0 * last - x[n - 2 - j]));

    let zi = lfilter_zi(tf)?;
    let scaled = |s: f64| zi.iter().map(|z| z * s).collect::<Vec<_>>();

    let (forward, _) = lfilter(tf, &ext, Some(&scaled(ext[0])))?;
    let mut reversed: Vec<f64> = forward.into_iter().rev().collect();
    let y0 = reversed[0];
    let (backward, _) = lfilter(tf, &reversed, Some(&scaled(y0)))?;
    reversed = backward.into_iter().rev().collect();
    Ok(reversed[edge..edge + n].to_vec())
}

/// Apply a Butterworth filter given the mean sample step of the input.
pub fn apply(x: &[f64], avg_dt: f64, params: &FilterParams) -> MathResult<Vec<f64>> {
    if !(params.cutoff > 0.0) || !params.cutoff.is_finite() {
        return Err(MathError::invalid(format!(
            "filter cutoff must be positive, got {}",
            params.cutoff
        )));
    }
    if !(avg_dt > 0.0) {
        return Err(MathError::InvalidTimeBase { avg_dt });
    }
    let fs = 1.0 / avg_dt;
    let wn = params.cutoff / (0.5 * fs);
    let tf = design(params.order, wn, params.kind)?;
    if params.filtfilt {
        filtfilt(&tf, x)
    } else {
        Ok(lfilter(&tf, x, None)?.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &[f64], b: &[f64], tol: f64) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() <= tol)
    }

    #[test]
    fn second_order_lowpass_matches_reference() {
        // Reference values: butter(2, 0.5).
        let tf = design(2, 0.5, FilterType::Low).unwrap();
        assert!(close(&tf.b, &[0.29289322, 0.58578644, 0.29289322], 1e-8));
        assert!(close(&tf.a, &[1.0, 0.0, 0.17157288], 1e-8));
    }

    #[test]
    fn first_order_highpass_matches_reference() {
        // Reference values: butter(1, 0.5, 'high').
        let tf = design(1, 0.5, FilterType::High).unwrap();
        assert!(close(&tf.b, &[0.5, -0.5], 1e-12));
        assert!(close(&tf.a, &[1.0, 0.0], 1e-12));
    }

    #[test]
    fn lowpass_has_unit_dc_gain() {
        for order in 1..=6 {
            let tf = design(order, 0.2, FilterType::Low).unwrap();
            let gain: f64 = tf.b.iter().sum::<f64>() / tf.a.iter().sum::<f64>();
            assert!((gain - 1.0).abs() < 1e-9, "order {order}: {gain}");
        }
    }

    #[test]
    fn highpass_blocks_dc() {
        let tf = design(3, 0.3, FilterType::High).unwrap();
        let dc: f64 = tf.b.iter().sum();
        assert!(dc.abs() < 1e-12);
    }

    #[test]
    fn steady_state_initial_conditions() {
        let tf = design(2, 0.25, FilterType::Low).unwrap();
        let zi = lfilter_zi(&tf).unwrap();
        let (y, _) = lfilter(&tf, &[1.0; 8], Some(&zi)).unwrap();
        assert!(y.iter().all(|v| (v - 1.0).abs() < 1e-12));
    }

    #[test]
    fn filtfilt_keeps_constant_signal() {
        let tf = design(4, 0.1, FilterType::Low).unwrap();
        let x = vec![3.5; 100];
        let y = filtfilt(&tf, &x).unwrap();
        assert_eq!(y.len(), x.len());
        assert!(y.iter().all(|v| (v - 3.5).abs() < 1e-9));
    }

    #[test]
    fn filtfilt_rejects_short_input() {
        let tf = design(2, 0.1, FilterType::Low).unwrap();
        assert!(filtfilt(&tf, &[1.0; 9]).is_err());
        assert!(filtfilt(&tf, &[1.0; 10]).is_ok());
    }

    #[test]
    fn invalid_design_parameters() {
        assert!(design(0, 0.5, FilterType::Low).is_err());
        assert!(design(2, 1.0, FilterType::Low).is_err());
        assert!(design(2, 0.0, FilterType::Low).is_err());
    }

    #[test]
    fn apply_checks_time_base_and_cutoff() {
        let p = FilterParams {
            order: 2,
            kind: FilterType::Low,
            cutoff: 5.0,
            filtfilt: false,
        };
        assert!(matches!(
            apply(&[1.0, 2.0], 0.0, &p),
            Err(MathError::InvalidTimeBase { .. })
        ));
        let zero = FilterParams { cutoff: 0.0, ..p.clone() };
        assert!(matches!(
            apply(&[1.0, 2.0], 0.01, &zero),
            Err(MathError::InvalidParameter { .. })
        ));
        assert_eq!(apply(&[1.0, 2.0, 3.0], 0.01, &p).unwrap().len(), 3);
    }
}
