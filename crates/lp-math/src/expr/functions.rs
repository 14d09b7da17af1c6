//! Vectorized function table for expressions.

use crate::error::{MathError, MathResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sqrt,
    Ceil,
    Floor,
    Round,
}

const TABLE: [(&str, Function); 10] = [
    ("sin", Function::Sin),
    ("cos", Function::Cos),
    ("tan", Function::Tan),
    ("asin", Function::Asin),
    ("acos", Function::Acos),
    ("atan", Function::Atan),
    ("sqrt", Function::Sqrt),
    ("ceil", Function::Ceil),
    ("floor", Function::Floor),
    ("round", Function::Round),
];

impl Function {
    pub fn lookup(name: &str) -> Option<Self> {
        TABLE.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
    }

    pub fn name(self) -> &'static str {
        TABLE
            .iter()
            .find(|(_, f)| *f == self)
            .map(|(n, _)| *n)
            .unwrap_or("?")
    }

    /// Apply to one sample. A finite argument that yields NaN is a domain error.
    pub fn apply(self, x: f64) -> MathResult<f64> {
        let y = match self {
            Function::Sin => x.sin(),
            Function::Cos => x.cos(),
            Function::Tan => x.tan(),
            Function::Asin => x.asin(),
            Function::Acos => x.acos(),
            Function::Atan => x.atan(),
            Function::Sqrt => x.sqrt(),
            Function::Ceil => x.ceil(),
            Function::Floor => x.floor(),
            Function::Round => x.round_ties_even(),
        };
        if x.is_finite() && y.is_nan() {
            return Err(MathError::ArithmeticFailure {
                what: format!("{}({x}) is undefined over the reals", self.name()),
            });
        }
        Ok(y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_matches_name() {
        for (name, f) in TABLE {
            assert_eq!(Function::lookup(name), Some(f));
            assert_eq!(f.name(), name);
        }
        assert_eq!(Function::lookup("exp"), None);
    }

    #[test]
    fn domain_errors() {
        assert!(Function::Sqrt.apply(-1.0).is_err());
        assert!(Function::Asin.apply(1.5).is_err());
        assert!(Function::Sqrt.apply(f64::NAN).unwrap().is_nan());
    }

    #[test]
    fn round_half_to_even() {
        assert_eq!(Function::Round.apply(0.5).unwrap(), 0.0);
        assert_eq!(Function::Round.apply(1.5).unwrap(), 2.0);
        assert_eq!(Function::Round.apply(2.5).unwrap(), 2.0);
    }
}
