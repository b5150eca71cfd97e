//! Lexer, parser, and evaluator for **Marduk binding expressions**.
//!
//! Property bindings compute a widget property from runtime parameters with a
//! tiny arithmetic language: numbers, identifiers, `+ - * /`, unary sign and
//! parentheses. This crate is dependency-free so editors and linters can
//! validate expressions without loading a document.
//!
//! # Structure
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`ast`] | `Expr`, `BinaryOp`, the `Resolve` trait and evaluation |
//! | [`error`] | `EvalError` |
//! | [`lexer`] | `Lexer`, `Token` |
//! | [`parser`] | `parse` entry point, nesting limit |
//!
//! # Quick start
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use marduk_expr::evaluate;
//!
//! let mut params = BTreeMap::new();
//! params.insert("gain".to_string(), 0.25);
//!
//! assert_eq!(evaluate("gain * 0.5", &params).unwrap(), 0.125);
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::{BinaryOp, Expr, Operand, Resolve};
pub use error::EvalError;
pub use parser::{parse, MAX_DEPTH};

/// Parses and evaluates `src` in one step.
pub fn evaluate<R: Resolve + ?Sized>(src: &str, scope: &R) -> Result<f64, EvalError> {
    parse(src)?.eval(scope)
}
