//! Error types for draftsafe-core

use thiserror::Error;

/// Result type alias using draftsafe-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in draftsafe-core operations
///
/// Save attempts never surface through this type; they are classified into
/// [`crate::SaveOutcome`] instead.
#[derive(Error, Debug)]
pub enum Error {
    /// `SQLite` error from the local backup store
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Local backup storage error (quota, unavailable)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The scheduler task has shut down and no longer accepts commands
    #[error("Auto-save scheduler is no longer running")]
    SchedulerClosed,
}
