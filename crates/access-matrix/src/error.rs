//! Error types for access-matrix

use thiserror::Error;

/// Errors raised by matrix operations.
///
/// Validation and lookup errors are produced before any mutation touches the
/// matrix, so a failed operation leaves it exactly as it was.
#[derive(Debug, Error)]
pub enum MatrixError {
    /// Malformed input: bad object token, empty or overlong subject name,
    /// empty subject list
    #[error("validation error: {0}")]
    Validation(String),

    /// Referenced subject does not exist
    #[error("subject '{subject}' does not exist")]
    NotFound {
        /// Name of the first missing subject
        subject: String,
    },

    /// Rename target already exists (or equals the source)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Persisted file unreadable or unwritable
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted document could not be parsed
    #[error("malformed matrix document: {0}")]
    Malformed(String),
}

/// Coarse classification of a [`MatrixError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Io,
}

impl MatrixError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        MatrixError::Validation(msg.into())
    }

    pub(crate) fn not_found(subject: impl Into<String>) -> Self {
        MatrixError::NotFound {
            subject: subject.into(),
        }
    }

    pub(crate) fn conflict(msg: impl Into<String>) -> Self {
        MatrixError::Conflict(msg.into())
    }

    /// Which part of the taxonomy this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MatrixError::Validation(_) => ErrorKind::Validation,
            MatrixError::NotFound { .. } => ErrorKind::NotFound,
            MatrixError::Conflict(_) => ErrorKind::Conflict,
            MatrixError::Io(_) | MatrixError::Malformed(_) => ErrorKind::Io,
        }
    }
}

impl From<serde_json::Error> for MatrixError {
    fn from(e: serde_json::Error) -> Self {
        MatrixError::Malformed(e.to_string())
    }
}

/// Result type alias for matrix operations
pub type Result<T> = std::result::Result<T, MatrixError>;
