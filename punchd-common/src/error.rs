//! Common error types for punchd

use thiserror::Error;

/// Common result type for punchd operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across punchd services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Device timestamp could not be parsed into a valid instant
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
