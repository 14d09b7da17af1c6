//! Numeric sample columns.

use std::borrow::Cow;

/// A column of samples.
///
/// Integer columns keep their type for display; every numeric consumer
/// widens them to `f64` through [`Samples::as_f64`].
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    Float(Vec<f64>),
    Int(Vec<i64>),
}

impl Samples {
    pub fn len(&self) -> usize {
        match self {
            Self::Float(v) => v.len(),
            Self::Int(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Int(_))
    }

    /// Borrow float data, widening integers into a fresh buffer.
    pub fn as_f64(&self) -> Cow<'_, [f64]> {
        match self {
            Self::Float(v) => Cow::Borrowed(v.as_slice()),
            Self::Int(v) => Cow::Owned(v.iter().map(|&x| x as f64).collect()),
        }
    }

    pub fn to_f64_vec(&self) -> Vec<f64> {
        self.as_f64().into_owned()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        match self {
            Self::Float(v) => v.get(index).copied(),
            Self::Int(v) => v.get(index).map(|&x| x as f64),
        }
    }

    /// Minimum and maximum, ignoring NaN. `None` when nothing is finite.
    pub fn range(&self) -> Option<(f64, f64)> {
        let data = self.as_f64();
        let mut it = data.iter().copied().filter(|v| !v.is_nan());
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

impl From<Vec<f64>> for Samples {
    fn from(v: Vec<f64>) -> Self {
        Self::Float(v)
    }
}

impl From<Vec<i64>> for Samples {
    fn from(v: Vec<i64>) -> Self {
        Self::Int(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_widen_on_demand() {
        let s = Samples::from(vec![1_i64, 2, 3]);
        assert!(s.is_integer());
        assert_eq!(s.as_f64().as_ref(), &[1.0, 2.0, 3.0]);
        assert_eq!(s.get(1), Some(2.0));
        assert_eq!(s.get(3), None);
    }

    #[test]
    fn float_borrow_is_zero_copy() {
        let s = Samples::from(vec![0.5, 1.5]);
        assert!(matches!(s.as_f64(), Cow::Borrowed(_)));
    }

    #[test]
    fn range_skips_nan() {
        let s = Samples::from(vec![f64::NAN, 3.0, -1.0]);
        assert_eq!(s.range(), Some((-1.0, 3.0)));
        assert_eq!(Samples::Float(vec![]).range(), None);
    }
}
