//! Single save attempt: guard, local backup, transport call, classification.

use std::sync::Arc;

use chrono::Local;
use tokio::time::Instant;

use super::session::DraftSaveSession;
use crate::backup::BackupStore;
use crate::models::{SaveOutcome, SaveRequest, SaveStatus, StatusSink};
use crate::transport::SaveTransport;

/// Identifies which session and edit revision a save attempt snapshotted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveAttempt {
    pub generation: u64,
    pub revision: u64,
}

/// A save that passed the guard and holds the single-flight slot
#[derive(Debug, Clone)]
pub struct SaveTicket {
    pub attempt: SaveAttempt,
    pub request: SaveRequest,
}

/// What the scheduler must do with its timers after an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterSave {
    Continue,
    /// Conflict: cancel both timers for the rest of the session
    StopTimers,
    /// The outcome belonged to a superseded session and was dropped
    Discarded,
}

pub struct SaveExecutor<T> {
    transport: Arc<T>,
    backups: Arc<dyn BackupStore>,
    status: Arc<dyn StatusSink>,
}

impl<T> Clone for SaveExecutor<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            backups: Arc::clone(&self.backups),
            status: Arc::clone(&self.status),
        }
    }
}

impl<T: SaveTransport> SaveExecutor<T> {
    pub fn new(
        transport: Arc<T>,
        backups: Arc<dyn BackupStore>,
        status: Arc<dyn StatusSink>,
    ) -> Self {
        Self {
            transport,
            backups,
            status,
        }
    }

    pub(crate) fn report(&self, status: &SaveStatus) {
        self.status.report(status);
    }

    /// Claim the single-flight slot and write the local backup.
    ///
    /// Returns `None` when nothing is dirty, a save is already in flight, the
    /// session is stopped, or the document has no identity yet. Backup write
    /// failures are logged and never block the attempt.
    pub fn begin(&self, session: &mut DraftSaveSession, content: String) -> Option<SaveTicket> {
        if session.stopped {
            tracing::debug!("Save skipped: session stopped after conflict");
            return None;
        }
        if session.saving {
            tracing::debug!("Save skipped: another save is in flight");
            return None;
        }
        if !session.dirty {
            return None;
        }
        let Some(document_id) = session.document_id.clone() else {
            tracing::debug!("Save skipped: document has no identity yet");
            return None;
        };

        session.saving = true;

        if let Err(error) = self.backups.write(&document_id, &content) {
            tracing::warn!(
                "Failed to write local backup for {}: {}",
                document_id,
                error
            );
        }

        self.report(&SaveStatus::Saving);

        Some(SaveTicket {
            attempt: SaveAttempt {
                generation: session.generation,
                revision: session.edit_revision,
            },
            request: SaveRequest {
                document_id,
                content,
                expected_version_token: session.expected_version_token,
            },
        })
    }

    /// Invoke the transport, converting errors and panics into
    /// `TransientFailure` so the caller always gets exactly one outcome.
    pub async fn run(&self, request: SaveRequest) -> SaveOutcome {
        let document_id = request.document_id.clone();
        let transport = Arc::clone(&self.transport);
        let attempt = tokio::spawn(async move { transport.save(request).await });

        match attempt.await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(error)) => {
                tracing::warn!("Transport failed to save {}: {}", document_id, error);
                SaveOutcome::TransientFailure {
                    message: error.to_string(),
                }
            }
            Err(join_error) => {
                tracing::error!("Save task for {} aborted: {}", document_id, join_error);
                SaveOutcome::TransientFailure {
                    message: "save attempt aborted unexpectedly".to_string(),
                }
            }
        }
    }

    /// Apply an outcome to the session, release the single-flight slot, and
    /// report the resulting status.
    pub fn apply(
        &self,
        session: &mut DraftSaveSession,
        attempt: SaveAttempt,
        outcome: SaveOutcome,
    ) -> AfterSave {
        if attempt.generation != session.generation {
            tracing::debug!(
                "Discarding save outcome from superseded session generation {}",
                attempt.generation
            );
            return AfterSave::Discarded;
        }

        session.saving = false;
        let document_id = session
            .document_id
            .as_ref()
            .map_or_else(String::new, ToString::to_string);

        match outcome {
            SaveOutcome::Success { new_version_token } => {
                session.expected_version_token = new_version_token;
                session.last_save_at = Instant::now();
                session.unauthorized = false;
                if attempt.revision == session.edit_revision {
                    session.dirty = false;
                }
                tracing::info!("Auto-saved document: {}", document_id);
                self.report(&SaveStatus::Saved { at: Local::now() });
                AfterSave::Continue
            }
            SaveOutcome::Conflict { message } => {
                session.stopped = true;
                tracing::warn!(
                    "Save rejected as stale for {}; auto-save stopped: {}",
                    document_id,
                    message
                );
                self.report(&SaveStatus::Stale { message });
                AfterSave::StopTimers
            }
            SaveOutcome::Unauthorized => {
                session.unauthorized = true;
                tracing::warn!("Save for {} needs re-authentication", document_id);
                self.report(&SaveStatus::Unauthorized);
                AfterSave::Continue
            }
            SaveOutcome::TransientFailure { message } => {
                tracing::warn!("Failed to save {}: {}", document_id, message);
                self.report(&SaveStatus::Error { message });
                AfterSave::Continue
            }
        }
    }

    /// Run one complete attempt against a session owned by the caller.
    ///
    /// Returns `None` when the guard rejected the attempt.
    pub async fn execute(
        &self,
        session: &mut DraftSaveSession,
        content: String,
    ) -> Option<SaveOutcome> {
        let ticket = self.begin(session, content)?;
        let outcome = self.run(ticket.request).await;
        self.apply(session, ticket.attempt, outcome.clone());
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autosave::SchedulerState;
    use crate::backup::MemoryBackupStore;
    use crate::models::{DocumentId, StatusKind};
    use crate::test_support::{FakeTransport, StatusLog};
    use pretty_assertions::assert_eq;

    struct Fixture {
        transport: Arc<FakeTransport>,
        backups: Arc<MemoryBackupStore>,
        statuses: StatusLog,
        executor: SaveExecutor<FakeTransport>,
    }

    fn fixture() -> Fixture {
        fixture_with_backups(Arc::new(MemoryBackupStore::new()))
    }

    fn fixture_with_backups(backups: Arc<MemoryBackupStore>) -> Fixture {
        let transport = Arc::new(FakeTransport::new());
        let statuses = StatusLog::default();
        let executor = SaveExecutor::new(
            Arc::clone(&transport),
            backups.clone(),
            Arc::new(statuses.clone()),
        );
        Fixture {
            transport,
            backups,
            statuses,
            executor,
        }
    }

    fn dirty_session() -> DraftSaveSession {
        let mut session = DraftSaveSession::new(Some(DocumentId::new("doc").unwrap()), 100);
        session.mark_dirty();
        session
    }

    #[tokio::test]
    async fn success_clears_dirty_and_updates_token() {
        let fx = fixture();
        fx.transport.push_outcome(SaveOutcome::Success {
            new_version_token: 200,
        });
        let mut session = dirty_session();

        let outcome = fx.executor.execute(&mut session, "body".to_string()).await;

        assert_eq!(
            outcome,
            Some(SaveOutcome::Success {
                new_version_token: 200
            })
        );
        assert!(!session.is_dirty());
        assert!(!session.is_saving());
        assert_eq!(session.expected_version_token(), 200);
        assert_eq!(
            fx.statuses.kinds(),
            vec![StatusKind::Saving, StatusKind::Saved]
        );

        let request = fx.transport.requests().remove(0);
        assert_eq!(request.content, "body");
        assert_eq!(request.expected_version_token, 100);
    }

    #[tokio::test]
    async fn backup_is_written_before_transport_call() {
        let fx = fixture();
        fx.transport.push_outcome(SaveOutcome::TransientFailure {
            message: "offline".to_string(),
        });
        let mut session = dirty_session();

        fx.executor.execute(&mut session, "safety net".to_string()).await;

        let backup = fx
            .backups
            .read(&DocumentId::new("doc").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(backup.body, "safety net");
    }

    #[tokio::test]
    async fn backup_failure_does_not_block_save() {
        let fx = fixture_with_backups(Arc::new(MemoryBackupStore::with_quota(4)));
        fx.transport.push_outcome(SaveOutcome::Success {
            new_version_token: 5,
        });
        let mut session = dirty_session();

        let outcome = fx.executor.execute(&mut session, "too large".to_string()).await;

        assert!(outcome.is_some_and(|outcome| outcome.is_success()));
        assert_eq!(fx.transport.call_count(), 1);
        assert!(fx.backups.is_empty());
    }

    #[tokio::test]
    async fn conflict_stops_session() {
        let fx = fixture();
        fx.transport.push_outcome(SaveOutcome::Conflict {
            message: "modified elsewhere".to_string(),
        });
        let mut session = dirty_session();

        let ticket = fx.executor.begin(&mut session, "x".to_string()).unwrap();
        let outcome = fx.executor.run(ticket.request).await;
        let after = fx.executor.apply(&mut session, ticket.attempt, outcome);

        assert_eq!(after, AfterSave::StopTimers);
        assert!(session.is_stopped());
        assert!(session.is_dirty());
        assert_eq!(
            fx.statuses.last(),
            Some(SaveStatus::Stale {
                message: "modified elsewhere".to_string()
            })
        );
    }

    #[tokio::test]
    async fn unauthorized_preserves_dirty_and_token() {
        let fx = fixture();
        fx.transport.push_outcome(SaveOutcome::Unauthorized);
        let mut session = dirty_session();

        fx.executor.execute(&mut session, "x".to_string()).await;

        assert!(session.is_dirty());
        assert!(!session.is_stopped());
        assert_eq!(session.expected_version_token(), 100);
        assert_eq!(session.state(), SchedulerState::PausedUnauthorized);
        assert_eq!(fx.statuses.last(), Some(SaveStatus::Unauthorized));
    }

    #[tokio::test]
    async fn transport_error_becomes_transient_failure() {
        let fx = fixture();
        fx.transport.push_error("connection reset");
        let mut session = dirty_session();

        let outcome = fx.executor.execute(&mut session, "x".to_string()).await;

        assert!(matches!(
            outcome,
            Some(SaveOutcome::TransientFailure { ref message }) if message.contains("connection reset")
        ));
        assert!(session.is_dirty());
        assert!(!session.is_saving());
        assert_eq!(fx.statuses.last().map(|status| status.kind()), Some(StatusKind::Error));
    }

    #[tokio::test]
    async fn transport_panic_releases_guard() {
        let fx = fixture();
        fx.transport.push_panic();
        let mut session = dirty_session();

        let outcome = fx.executor.execute(&mut session, "x".to_string()).await;

        assert!(matches!(outcome, Some(SaveOutcome::TransientFailure { .. })));
        assert!(!session.is_saving());
        assert!(session.can_begin_save());
    }

    #[tokio::test]
    async fn guard_rejects_clean_stopped_inflight_or_anonymous() {
        let fx = fixture();

        let mut clean = DraftSaveSession::new(Some(DocumentId::new("doc").unwrap()), 1);
        assert!(fx.executor.begin(&mut clean, "x".to_string()).is_none());

        let mut stopped = dirty_session();
        stopped.stopped = true;
        assert!(fx.executor.begin(&mut stopped, "x".to_string()).is_none());

        let mut anonymous = DraftSaveSession::new(None, 0);
        anonymous.mark_dirty();
        assert!(fx.executor.begin(&mut anonymous, "x".to_string()).is_none());

        let mut session = dirty_session();
        assert!(fx.executor.begin(&mut session, "x".to_string()).is_some());
        assert!(fx.executor.begin(&mut session, "x".to_string()).is_none());

        assert_eq!(fx.transport.call_count(), 0);
        assert!(fx.backups.len() <= 1);
    }

    #[tokio::test]
    async fn edit_during_flight_keeps_dirty_after_success() {
        let fx = fixture();
        let mut session = dirty_session();

        let ticket = fx.executor.begin(&mut session, "v1".to_string()).unwrap();
        session.mark_dirty();
        fx.executor.apply(
            &mut session,
            ticket.attempt,
            SaveOutcome::Success {
                new_version_token: 101,
            },
        );

        assert!(session.is_dirty());
        assert_eq!(session.expected_version_token(), 101);
    }

    #[tokio::test]
    async fn outcome_from_old_generation_is_discarded() {
        let fx = fixture();
        let mut session = dirty_session();
        let ticket = fx.executor.begin(&mut session, "v1".to_string()).unwrap();

        let mut reloaded = session.next_generation(Some(DocumentId::new("doc").unwrap()), 500);
        let after = fx.executor.apply(
            &mut reloaded,
            ticket.attempt,
            SaveOutcome::Conflict {
                message: "late".to_string(),
            },
        );

        assert_eq!(after, AfterSave::Discarded);
        assert!(!reloaded.is_stopped());
        assert_eq!(reloaded.expected_version_token(), 500);
    }
}
