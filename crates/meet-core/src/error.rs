//! Error taxonomy for timing and reconciliation operations.
//!
//! Every error is scoped to the single operation that produced it; the state the
//! operation targeted is left exactly as it was.

use thiserror::Error;

use crate::types::ValidationError;

/// Errors raised by core operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The operation is not legal in the current lifecycle state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A referenced competition, event, heat, lane or result does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A field could not be parsed in strict mode.
    #[error("malformed {field}: {value:?}")]
    MalformedInput { field: &'static str, value: String },

    /// A value failed type-level validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub(crate) fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn malformed(field: &'static str, value: impl Into<String>) -> Self {
        Self::MalformedInput {
            field,
            value: value.into(),
        }
    }

    /// Whether this error reports an illegal lifecycle transition.
    pub const fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState(_))
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
