use std::collections::{BTreeMap, HashMap};

use crate::error::EvalError;

/// Denominators at or below this magnitude are treated as zero.
pub const DIVISION_EPSILON: f64 = 1e-12;

// ── AST ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

/// A parsed arithmetic expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// A runtime parameter reference. `offset` points into the trimmed source.
    Ident { name: String, offset: usize },
    Neg(Box<Expr>),
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
}

// ── Resolve ───────────────────────────────────────────────────────────────

/// A resolved parameter value, before numeric coercion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand<'a> {
    Number(f64),
    /// Text is accepted when it parses as a decimal number.
    Text(&'a str),
    /// Any other value type; carries a type name for the error message.
    Unsupported(&'static str),
}

/// Lookup of identifiers used by [`Expr::eval`].
///
/// Resolution tries [`resolve`](Resolve::resolve) first and only falls back to
/// [`resolve_ignore_case`](Resolve::resolve_ignore_case) when the exact key is
/// missing.
pub trait Resolve {
    fn resolve(&self, name: &str) -> Option<Operand<'_>>;

    fn resolve_ignore_case(&self, _name: &str) -> Option<Operand<'_>> {
        None
    }
}

macro_rules! impl_resolve_for_map {
    ($($map:ident),+) => {$(
        impl Resolve for $map<String, f64> {
            fn resolve(&self, name: &str) -> Option<Operand<'_>> {
                self.get(name).map(|v| Operand::Number(*v))
            }

            fn resolve_ignore_case(&self, name: &str) -> Option<Operand<'_>> {
                let lowered = name.to_lowercase();
                self.iter()
                    .find(|(k, _)| k.to_lowercase() == lowered)
                    .map(|(_, v)| Operand::Number(*v))
            }
        }
    )+};
}

impl_resolve_for_map!(BTreeMap, HashMap);

// ── Evaluation ────────────────────────────────────────────────────────────

impl Expr {
    /// Evaluates the expression against `scope`.
    ///
    /// The result is always finite; overflow to infinity or NaN is an error.
    pub fn eval<R: Resolve + ?Sized>(&self, scope: &R) -> Result<f64, EvalError> {
        let value = self.eval_node(scope)?;
        if !value.is_finite() {
            return Err(EvalError::eval("expression result is not finite"));
        }
        Ok(value)
    }

    /// Every identifier referenced by the expression, in source order, without
    /// duplicates.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Number(_) => {}
            Expr::Ident { name, .. } => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Expr::Neg(inner) => inner.collect_identifiers(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.collect_identifiers(out);
                rhs.collect_identifiers(out);
            }
        }
    }

    fn eval_node<R: Resolve + ?Sized>(&self, scope: &R) -> Result<f64, EvalError> {
        match self {
            Expr::Number(n) => Ok(*n),
            Expr::Ident { name, offset } => resolve_number(scope, name, *offset),
            Expr::Neg(inner) => Ok(-inner.eval_node(scope)?),
            Expr::Binary { op, lhs, rhs } => {
                let l = lhs.eval_node(scope)?;
                let r = rhs.eval_node(scope)?;
                match op {
                    BinaryOp::Add => Ok(l + r),
                    BinaryOp::Sub => Ok(l - r),
                    BinaryOp::Mul => Ok(l * r),
                    BinaryOp::Div => {
                        if r.abs() <= DIVISION_EPSILON {
                            Err(EvalError::eval("division by zero"))
                        } else {
                            Ok(l / r)
                        }
                    }
                }
            }
        }
    }
}

fn resolve_number<R: Resolve + ?Sized>(scope: &R, name: &str, offset: usize) -> Result<f64, EvalError> {
    let operand = scope
        .resolve(name)
        .or_else(|| scope.resolve_ignore_case(name))
        .ok_or_else(|| EvalError::at(format!("unknown runtime param '{}'", name), offset))?;

    match operand {
        Operand::Number(n) if n.is_finite() => Ok(n),
        Operand::Number(_) => Err(EvalError::at(
            format!("runtime param '{}' is not a finite number", name),
            offset,
        )),
        Operand::Text(text) => match text.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(n),
            _ => Err(EvalError::at(
                format!("runtime param '{}' holds non-numeric text {:?}", name, text),
                offset,
            )),
        },
        Operand::Unsupported(type_name) => Err(EvalError::at(
            format!("runtime param '{}' has non-numeric type {}", name, type_name),
            offset,
        )),
    }
}
