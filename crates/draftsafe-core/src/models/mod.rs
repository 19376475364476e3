//! Data models for draftsafe

mod backup;
mod document;
mod outcome;
mod status;

pub use backup::{LocalBackup, RecoveryCandidate};
pub use document::DocumentId;
pub use outcome::{SaveOutcome, SaveRequest};
pub use status::{watch_status, SaveStatus, StatusKind, StatusSink};
