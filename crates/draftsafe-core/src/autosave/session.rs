//! Per-document save session state

use serde::Serialize;
use tokio::time::Instant;

use crate::models::DocumentId;

/// Observable state of the auto-save state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulerState {
    Idle,
    /// Content changed since the last successful save
    DirtyPending,
    Saving,
    /// Last attempt was rejected for expired credentials
    PausedUnauthorized,
    /// A conflict ended automatic saving until the document is reloaded
    Stopped,
}

/// Mutable state of one open document, owned by the scheduler task
#[derive(Debug, Clone)]
pub struct DraftSaveSession {
    pub(crate) document_id: Option<DocumentId>,
    pub(crate) expected_version_token: i64,
    pub(crate) dirty: bool,
    /// Monotonic time of the last successful save, or of session start
    pub(crate) last_save_at: Instant,
    pub(crate) stopped: bool,
    pub(crate) saving: bool,
    pub(crate) unauthorized: bool,
    pub(crate) edit_revision: u64,
    pub(crate) generation: u64,
}

impl DraftSaveSession {
    pub fn new(document_id: Option<DocumentId>, expected_version_token: i64) -> Self {
        Self {
            document_id,
            expected_version_token,
            dirty: false,
            last_save_at: Instant::now(),
            stopped: false,
            saving: false,
            unauthorized: false,
            edit_revision: 0,
            generation: 0,
        }
    }

    /// Start a fresh session for a newly loaded document identity
    #[must_use]
    pub fn next_generation(&self, document_id: Option<DocumentId>, version_token: i64) -> Self {
        Self {
            generation: self.generation.wrapping_add(1),
            ..Self::new(document_id, version_token)
        }
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
        self.edit_revision = self.edit_revision.wrapping_add(1);
    }

    pub const fn document_id(&self) -> Option<&DocumentId> {
        self.document_id.as_ref()
    }

    pub const fn expected_version_token(&self) -> i64 {
        self.expected_version_token
    }

    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub const fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub const fn is_saving(&self) -> bool {
        self.saving
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a save could start right now
    pub const fn can_begin_save(&self) -> bool {
        self.dirty && !self.saving && !self.stopped && self.document_id.is_some()
    }

    pub const fn state(&self) -> SchedulerState {
        if self.stopped {
            SchedulerState::Stopped
        } else if self.saving {
            SchedulerState::Saving
        } else if self.unauthorized {
            SchedulerState::PausedUnauthorized
        } else if self.dirty {
            SchedulerState::DirtyPending
        } else {
            SchedulerState::Idle
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            document_id: self.document_id.clone(),
            state: self.state(),
            dirty: self.dirty,
            expected_version_token: self.expected_version_token,
            generation: self.generation,
        }
    }
}

/// Point-in-time copy of a session for UIs, tooling, and tests
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub document_id: Option<DocumentId>,
    pub state: SchedulerState,
    pub dirty: bool,
    pub expected_version_token: i64,
    pub generation: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> DocumentId {
        DocumentId::new("doc").unwrap()
    }

    #[test]
    fn new_session_is_idle() {
        let session = DraftSaveSession::new(Some(doc()), 7);
        assert_eq!(session.state(), SchedulerState::Idle);
        assert!(!session.can_begin_save());
    }

    #[test]
    fn mark_dirty_bumps_revision() {
        let mut session = DraftSaveSession::new(Some(doc()), 7);
        session.mark_dirty();
        session.mark_dirty();
        assert_eq!(session.edit_revision, 2);
        assert_eq!(session.state(), SchedulerState::DirtyPending);
        assert!(session.can_begin_save());
    }

    #[test]
    fn save_needs_identity() {
        let mut session = DraftSaveSession::new(None, 0);
        session.mark_dirty();
        assert!(!session.can_begin_save());
    }

    #[test]
    fn stopped_wins_over_other_flags() {
        let mut session = DraftSaveSession::new(Some(doc()), 7);
        session.mark_dirty();
        session.unauthorized = true;
        session.stopped = true;
        assert_eq!(session.state(), SchedulerState::Stopped);
        assert!(!session.can_begin_save());
    }

    #[test]
    fn next_generation_starts_clean() {
        let mut session = DraftSaveSession::new(Some(doc()), 7);
        session.mark_dirty();
        session.stopped = true;

        let next = session.next_generation(Some(DocumentId::new("other").unwrap()), 9);
        assert_eq!(next.generation(), 1);
        assert!(!next.is_stopped());
        assert!(!next.is_dirty());
        assert_eq!(next.expected_version_token(), 9);
    }
}
