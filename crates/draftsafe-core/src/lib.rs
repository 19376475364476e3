//! draftsafe-core - Core library for draftsafe
//!
//! Keeps in-progress editor content safe against an unreliable remote store:
//! a debounced auto-save scheduler with a max-wait ceiling, a single-flight
//! save executor that classifies every attempt into a closed outcome, a
//! best-effort local backup written before each attempt, and a recovery
//! reconciler that decides on load whether that backup is unsaved work.

pub mod autosave;
pub mod backup;
pub mod config;
pub mod content;
pub mod error;
pub mod models;
pub mod recovery;
pub mod transport;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;

pub use autosave::{AutoSaveHandle, AutoSaveScheduler, SchedulerState, SessionSnapshot};
pub use config::AutoSaveConfig;
pub use error::{Error, Result};
pub use models::{DocumentId, LocalBackup, RecoveryCandidate, SaveOutcome, SaveRequest, SaveStatus};
