use crate::CoreError;

/// Sample value type.
pub type Real = f64;

/// Absolute and relative tolerance used when comparing reproduced samples.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Tolerances {
    pub const fn new(abs: Real, rel: Real) -> Self {
        Self { abs, rel }
    }

    /// Absolute bound only.
    pub const fn absolute(abs: Real) -> Self {
        Self { abs, rel: 0.0 }
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self::new(1e-12, 1e-9)
    }
}

/// Equal within `tol`. NaN matches NaN so reproduced gaps compare equal.
pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    if a == b || (a.is_nan() && b.is_nan()) {
        return true;
    }
    let diff = (a - b).abs();
    diff <= tol.abs || diff <= tol.rel * a.abs().max(b.abs())
}

/// [`nearly_equal`] sample by sample; slices of different length never match.
pub fn all_close(a: &[Real], b: &[Real], tol: Tolerances) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| nearly_equal(*x, *y, tol))
}

pub fn ensure_finite(value: Real, what: &'static str) -> Result<Real, CoreError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CoreError::NonFinite { what, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerance_bounds() {
        let tol = Tolerances::default();
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
        assert!(nearly_equal(Real::INFINITY, Real::INFINITY, tol));
        assert!(!nearly_equal(1e6, 1e6 + 1.0, Tolerances::absolute(1e-12)));
    }

    #[test]
    fn nan_gaps_compare_equal() {
        let tol = Tolerances::absolute(0.0);
        assert!(all_close(&[1.0, Real::NAN], &[1.0, Real::NAN], tol));
        assert!(!all_close(&[1.0, Real::NAN], &[1.0, 2.0], tol));
        assert!(!all_close(&[1.0, 2.0], &[1.0], tol));
    }

    #[test]
    fn ensure_finite_rejects_nan() {
        let err = ensure_finite(Real::NAN, "offset").unwrap_err();
        assert!(err.to_string().contains("offset"));
    }
}
