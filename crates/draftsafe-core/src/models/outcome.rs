//! Save request and outcome models

use serde::{Deserialize, Serialize};

use super::DocumentId;

/// One save attempt handed to the transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub document_id: DocumentId,
    pub content: String,
    /// Last update time acknowledged by the remote store, sent as the
    /// optimistic-concurrency precondition
    pub expected_version_token: i64,
}

/// Classified result of exactly one save attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SaveOutcome {
    /// The remote store accepted the content at a new version
    Success { new_version_token: i64 },
    /// The remote version moved past the expected token (stale edit)
    Conflict { message: String },
    /// Credentials expired; content must be kept for a retry
    Unauthorized,
    /// Network or server failure, retried by the next timer cycle
    TransientFailure { message: String },
}

impl SaveOutcome {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}
