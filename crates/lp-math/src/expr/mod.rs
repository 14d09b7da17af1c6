//! Infix arithmetic expressions over named sample sequences.
//!
//! ```
//! use lp_math::expr::{Bindings, Expr};
//!
//! let expr = Expr::parse("x0 + 2 * x1").unwrap();
//! assert_eq!(expr.variables(), ["x0", "x1"]);
//!
//! let a = [1.0, 2.0];
//! let b = [10.0, 20.0];
//! let out = expr
//!     .evaluate(&Bindings::new().bind("x0", &a).bind("x1", &b))
//!     .unwrap();
//! assert_eq!(out, vec![21.0, 42.0]);
//! ```

mod functions;
mod parser;

use std::collections::HashMap;
use std::fmt;

pub use functions::Function;

use crate::error::{MathError, MathResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinOp {
    fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Pow => "^",
        }
    }

    fn precedence(self) -> u8 {
        match self {
            BinOp::Add | BinOp::Sub => 1,
            BinOp::Mul | BinOp::Div => 2,
            BinOp::Pow => 4,
        }
    }

    fn apply(self, a: f64, b: f64) -> MathResult<f64> {
        let y = match self {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            BinOp::Mul => a * b,
            BinOp::Div => a / b,
            BinOp::Pow => a.powf(b),
        };
        if self == BinOp::Pow && a.is_finite() && b.is_finite() && y.is_nan() {
            return Err(MathError::ArithmeticFailure {
                what: format!("{a}^{b} is undefined over the reals"),
            });
        }
        Ok(y)
    }
}

/// Expression tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Number(f64),
    Var(String),
    Neg(Box<Node>),
    Binary {
        op: BinOp,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Call {
        func: Function,
        arg: Box<Node>,
    },
}

const NEG_PRECEDENCE: u8 = 3;
const ATOM_PRECEDENCE: u8 = 5;

impl Node {
    fn precedence(&self) -> u8 {
        match self {
            Node::Binary { op, .. } => op.precedence(),
            Node::Neg(_) => NEG_PRECEDENCE,
            Node::Number(v) if *v < 0.0 => NEG_PRECEDENCE,
            _ => ATOM_PRECEDENCE,
        }
    }

    fn collect_variables(&self, out: &mut Vec<String>) {
        match self {
            Node::Number(_) => {}
            Node::Var(name) => {
                if !out.iter().any(|v| v == name) {
                    out.push(name.clone());
                }
            }
            Node::Neg(inner) => inner.collect_variables(out),
            Node::Binary { lhs, rhs, .. } => {
                lhs.collect_variables(out);
                rhs.collect_variables(out);
            }
            Node::Call { arg, .. } => arg.collect_variables(out),
        }
    }

    fn eval(&self, bindings: &Bindings<'_>) -> MathResult<Value> {
        match self {
            Node::Number(v) => Ok(Value::Scalar(*v)),
            Node::Var(name) => bindings
                .get(name)
                .map(|data| Value::Vector(data.to_vec()))
                .ok_or_else(|| MathError::UnboundVariable { name: name.clone() }),
            Node::Neg(inner) => Ok(inner.eval(bindings)?.map(|x| Ok(-x))?),
            Node::Call { func, arg } => arg.eval(bindings)?.map(|x| func.apply(x)),
            Node::Binary { op, lhs, rhs } => {
                let a = lhs.eval(bindings)?;
                let b = rhs.eval(bindings)?;
                Value::zip(a, b, |x, y| op.apply(x, y))
            }
        }
    }

    fn fmt_child(&self, f: &mut fmt::Formatter<'_>, parenthesize: bool) -> fmt::Result {
        if parenthesize {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Number(v) => write!(f, "{v}"),
            Node::Var(name) => f.write_str(name),
            Node::Neg(inner) => {
                f.write_str("-")?;
                inner.fmt_child(f, inner.precedence() < NEG_PRECEDENCE)
            }
            Node::Call { func, arg } => write!(f, "{}({arg})", func.name()),
            Node::Binary { op, lhs, rhs } => {
                let p = op.precedence();
                let (wrap_lhs, wrap_rhs) = if *op == BinOp::Pow {
                    (lhs.precedence() <= p, rhs.precedence() < p)
                } else {
                    let strict_rhs = matches!(op, BinOp::Sub | BinOp::Div);
                    (
                        lhs.precedence() < p,
                        rhs.precedence() < p || (strict_rhs && rhs.precedence() == p),
                    )
                };
                lhs.fmt_child(f, wrap_lhs)?;
                if *op == BinOp::Pow {
                    f.write_str(op.symbol())?;
                } else {
                    write!(f, " {} ", op.symbol())?;
                }
                rhs.fmt_child(f, wrap_rhs)
            }
        }
    }
}

/// Intermediate value: constants stay scalar until they meet a sequence.
#[derive(Debug, Clone)]
enum Value {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl Value {
    fn map(self, f: impl Fn(f64) -> MathResult<f64>) -> MathResult<Value> {
        match self {
            Value::Scalar(x) => Ok(Value::Scalar(f(x)?)),
            Value::Vector(mut v) => {
                for x in v.iter_mut() {
                    *x = f(*x)?;
                }
                Ok(Value::Vector(v))
            }
        }
    }

    fn zip(a: Value, b: Value, f: impl Fn(f64, f64) -> MathResult<f64>) -> MathResult<Value> {
        match (a, b) {
            (Value::Scalar(x), Value::Scalar(y)) => Ok(Value::Scalar(f(x, y)?)),
            (Value::Vector(mut v), Value::Scalar(y)) => {
                for x in v.iter_mut() {
                    *x = f(*x, y)?;
                }
                Ok(Value::Vector(v))
            }
            (Value::Scalar(x), Value::Vector(mut v)) => {
                for y in v.iter_mut() {
                    *y = f(x, *y)?;
                }
                Ok(Value::Vector(v))
            }
            (Value::Vector(mut v), Value::Vector(w)) => {
                if v.len() != w.len() {
                    return Err(MathError::LengthMismatch {
                        expected: v.len(),
                        actual: w.len(),
                    });
                }
                for (x, y) in v.iter_mut().zip(w) {
                    *x = f(*x, y)?;
                }
                Ok(Value::Vector(v))
            }
        }
    }
}

/// Variable name → sample sequence.
#[derive(Debug, Clone, Default)]
pub struct Bindings<'a> {
    map: HashMap<String, &'a [f64]>,
    order: Vec<String>,
}

impl<'a> Bindings<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(mut self, name: impl Into<String>, data: &'a [f64]) -> Self {
        self.insert(name, data);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, data: &'a [f64]) {
        let name = name.into();
        if self.map.insert(name.clone(), data).is_none() {
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<&'a [f64]> {
        self.map.get(name).copied()
    }

    /// Common length of every bound sequence, or `None` when nothing is bound.
    fn common_len(&self) -> MathResult<Option<usize>> {
        let mut len = None;
        for name in &self.order {
            let n = self.map[name].len();
            match len {
                None => len = Some(n),
                Some(expected) if expected != n => {
                    return Err(MathError::LengthMismatch {
                        expected,
                        actual: n,
                    });
                }
                Some(_) => {}
            }
        }
        Ok(len)
    }
}

/// A parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    root: Node,
    variables: Vec<String>,
}

impl Expr {
    pub fn parse(src: &str) -> MathResult<Self> {
        let root = parser::Parser::new(src)?.parse()?;
        let mut variables = Vec::new();
        root.collect_variables(&mut variables);
        Ok(Self { root, variables })
    }

    /// Free variables in order of first occurrence.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn arity(&self) -> usize {
        self.variables.len()
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Evaluate pointwise.
    ///
    /// The output has the common length of the bound sequences; an
    /// expression without variables evaluates to a single sample.
    pub fn evaluate(&self, bindings: &Bindings<'_>) -> MathResult<Vec<f64>> {
        let len = bindings.common_len()?;
        for name in &self.variables {
            if bindings.get(name).is_none() {
                return Err(MathError::UnboundVariable { name: name.clone() });
            }
        }
        match self.root.eval(bindings)? {
            Value::Vector(v) => Ok(v),
            Value::Scalar(x) => Ok(vec![x; len.unwrap_or(1)]),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval1(src: &str, x: &[f64]) -> MathResult<Vec<f64>> {
        Expr::parse(src)?.evaluate(&Bindings::new().bind("x0", x))
    }

    #[test]
    fn precedence_and_associativity() {
        assert_eq!(eval1("1 + 2 * 3", &[]).unwrap(), vec![7.0]);
        assert_eq!(eval1("2 ^ 3 ^ 2", &[]).unwrap(), vec![512.0]);
        assert_eq!(eval1("-2 ^ 2", &[]).unwrap(), vec![-4.0]);
        assert_eq!(eval1("(1 + 2) * 3", &[]).unwrap(), vec![9.0]);
        assert_eq!(eval1("8 / 4 / 2", &[]).unwrap(), vec![1.0]);
        assert_eq!(eval1("2 ^ -1", &[]).unwrap(), vec![0.5]);
    }

    #[test]
    fn variables_in_first_occurrence_order() {
        let e = Expr::parse("x1 * sin(x0) + x1 - x2").unwrap();
        assert_eq!(e.variables(), ["x1", "x0", "x2"]);
        assert_eq!(e.arity(), 3);
    }

    #[test]
    fn scalar_broadcasts_to_bound_length() {
        let out = Expr::parse("3")
            .unwrap()
            .evaluate(&Bindings::new().bind("x0", &[1.0, 2.0]))
            .unwrap();
        assert_eq!(out, vec![3.0, 3.0]);
    }

    #[test]
    fn functions_vectorize() {
        let out = eval1("floor(x0) + ceil(x0) + round(x0)", &[1.5, -0.2]).unwrap();
        assert_eq!(out, vec![1.0 + 2.0 + 2.0, -1.0 + 0.0 + 0.0]);
    }

    #[test]
    fn errors() {
        assert!(matches!(
            Expr::parse("x0 + y").unwrap().evaluate(&Bindings::new().bind("x0", &[1.0])),
            Err(MathError::UnboundVariable { name }) if name == "y"
        ));
        assert!(matches!(
            eval1("sqrt(x0)", &[4.0, -1.0]),
            Err(MathError::ArithmeticFailure { .. })
        ));
        let a = [1.0, 2.0];
        let b = [1.0];
        assert!(matches!(
            Expr::parse("x0 + x1")
                .unwrap()
                .evaluate(&Bindings::new().bind("x0", &a).bind("x1", &b)),
            Err(MathError::LengthMismatch { expected: 2, actual: 1 })
        ));
        assert!(matches!(Expr::parse(""), Err(MathError::Parse { .. })));
        assert!(matches!(Expr::parse("(x0"), Err(MathError::Parse { .. })));
        assert!(matches!(Expr::parse("exp(x0)"), Err(MathError::Parse { .. })));
        assert!(matches!(Expr::parse("x0 x1"), Err(MathError::Parse { .. })));
    }

    #[test]
    fn division_by_zero_follows_ieee() {
        let out = eval1("1 / x0", &[0.0]).unwrap();
        assert!(out[0].is_infinite());
    }

    #[test]
    fn display_reparses_to_same_tree() {
        for src in [
            "x0 + x1 * x2",
            "(x0 + x1) * x2",
            "x0 - (x1 - x2)",
            "x0 / (x1 * x2)",
            "-x0 ^ 2",
            "(-x0) ^ 2",
            "x0 ^ (-1)",
            "(x0 ^ x1) ^ x2",
            "sqrt(x0 + 1) * -x1",
        ] {
            let e = Expr::parse(src).unwrap();
            let again = Expr::parse(&e.to_string()).unwrap();
            assert_eq!(e, again, "{src} rendered as {e}");
        }
    }
}
