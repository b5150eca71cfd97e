use std::fmt;

/// A parse or evaluation error from a binding expression.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalError {
    pub message: String,
    /// Byte offset into the trimmed source where the error was detected.
    /// `None` for evaluation-time failures that have no single location.
    pub offset: Option<usize>,
}

impl EvalError {
    pub(crate) fn at(msg: impl Into<String>, offset: usize) -> Self {
        Self { message: msg.into(), offset: Some(offset) }
    }

    pub(crate) fn eval(msg: impl Into<String>) -> Self {
        Self { message: msg.into(), offset: None }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "expression error at {}: {}", offset, self.message),
            None => write!(f, "expression error: {}", self.message),
        }
    }
}

impl std::error::Error for EvalError {}
