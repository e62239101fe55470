//! Error types for punchd-ingest
//!
//! Defines service-specific error types using thiserror for clear error
//! propagation. Per-record errors carry a wire `errorKind` so one bad
//! record never aborts its siblings.

use thiserror::Error;

/// Main error type for the ingest service
#[derive(Error, Debug)]
pub enum Error {
    /// Errors from the shared punchd-common library
    #[error(transparent)]
    Common(#[from] punchd_common::Error),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Listener could not bind during startup
    #[error("Listener bind failure: {0}")]
    ListenerBind(String),

    /// Device-reported employee code has no directory mapping
    #[error("Unknown employee: {0}")]
    UnknownEmployee(String),

    /// Attendance store could not be reached
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Per-record processing exceeded the configured timeout
    #[error("Record timed out: {0}")]
    Timeout(String),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Wire error kind surfaced in per-record results
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Common(punchd_common::Error::InvalidTimestamp(_)) => "InvalidTimestamp",
            Error::UnknownEmployee(_) => "UnknownEmployee",
            Error::Database(_)
            | Error::StoreUnavailable(_)
            | Error::Common(punchd_common::Error::Database(_)) => "StoreUnavailable",
            Error::Timeout(_) => "Timeout",
            _ => "Internal",
        }
    }
}

/// Convenience Result type using the ingest Error
pub type Result<T> = std::result::Result<T, Error>;
