use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] draftsafe_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("No content provided. Pass --file or pipe content on stdin")]
    EmptyContent,
    #[error("No local backup for document {0}")]
    BackupNotFound(String),
    #[error(
        "No API base URL configured. Run `draftsafe config init --api-base-url <URL>` or set DRAFTSAFE_API_BASE_URL."
    )]
    ApiNotConfigured,
    #[error("Save did not complete: {0}")]
    SaveFailed(String),
}
