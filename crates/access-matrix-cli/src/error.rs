//! CLI error types

use access_matrix::MatrixError;
use thiserror::Error;

/// CLI error types
#[derive(Debug, Error)]
pub enum CliError {
    /// Matrix operation failed
    #[error(transparent)]
    Matrix(#[from] MatrixError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Background task failure
    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
