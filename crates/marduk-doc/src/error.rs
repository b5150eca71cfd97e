//! Error type shared by the validator and the reducer.

use thiserror::Error;

use crate::model::NodeKind;

/// Why an action was rejected.
///
/// Every variant is recoverable: the document is left exactly as it was and
/// the message is suitable for showing to the user verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocError {
    /// Structural or contract violation caught before any mutation.
    #[error("invalid action: {0}")]
    Invalid(String),

    /// An action referenced an id that does not exist in the document.
    #[error("{kind} {id} not found")]
    NotFound { kind: NodeKind, id: i64 },

    /// An id collision, e.g. a forced create id that is already taken.
    #[error("{kind} {id} already exists")]
    AlreadyExists { kind: NodeKind, id: i64 },

    /// A documented limitation, e.g. hierarchical reparenting.
    #[error("{0} not supported yet")]
    NotSupported(String),

    /// The id space is exhausted.
    #[error("unable to allocate a valid widget id")]
    IdExhausted,
}

impl DocError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        DocError::Invalid(msg.into())
    }
}

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, DocError>;
