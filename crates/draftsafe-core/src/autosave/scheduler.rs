//! Auto-save scheduler task and its handle.
//!
//! The scheduler owns the session and both timers inside one task, so every
//! state change is serialized without locks. Editor surfaces talk to it
//! through a cloneable [`AutoSaveHandle`]; network saves run in spawned tasks
//! and report back tagged with the session generation they started in.

use std::future::pending;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior};

use super::executor::{AfterSave, SaveAttempt, SaveExecutor};
use super::session::{DraftSaveSession, SessionSnapshot};
use crate::backup::BackupStore;
use crate::config::AutoSaveConfig;
use crate::content::ContentSource;
use crate::error::{Error, Result};
use crate::models::{DocumentId, SaveOutcome, SaveStatus, StatusSink};
use crate::transport::SaveTransport;

enum Command {
    MarkDirty,
    TriggerSave,
    LoadDocument {
        document_id: Option<DocumentId>,
        version_token: i64,
    },
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Shutdown,
}

struct SaveFinished {
    attempt: SaveAttempt,
    outcome: SaveOutcome,
}

/// Assembles the collaborators of an auto-save session
pub struct AutoSaveScheduler<T> {
    config: AutoSaveConfig,
    executor: SaveExecutor<T>,
    source: Arc<dyn ContentSource>,
}

impl<T: SaveTransport> AutoSaveScheduler<T> {
    pub fn new(
        config: AutoSaveConfig,
        transport: T,
        backups: Arc<dyn BackupStore>,
        source: impl ContentSource,
        status: impl StatusSink,
    ) -> Result<Self> {
        Self::with_shared(
            config,
            Arc::new(transport),
            backups,
            Arc::new(source),
            Arc::new(status),
        )
    }

    /// Build from already-shared collaborators
    pub fn with_shared(
        config: AutoSaveConfig,
        transport: Arc<T>,
        backups: Arc<dyn BackupStore>,
        source: Arc<dyn ContentSource>,
        status: Arc<dyn StatusSink>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            executor: SaveExecutor::new(transport, backups, status),
            source,
        })
    }

    /// Start the scheduler task for a document session.
    ///
    /// `document_id` is `None` for an unsaved-new document; timer-driven saves
    /// stay off until [`AutoSaveHandle::load_document`] supplies an identity.
    /// Must be called from within a Tokio runtime.
    pub fn spawn(self, document_id: Option<DocumentId>, version_token: i64) -> AutoSaveHandle {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (finished_tx, finished_rx) = mpsc::unbounded_channel();

        let poll_interval = self.config.poll_interval();
        let mut poller = interval_at(Instant::now() + poll_interval, poll_interval);
        poller.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let task = SchedulerTask {
            config: self.config,
            executor: self.executor,
            source: self.source,
            session: DraftSaveSession::new(document_id, version_token),
            debounce_deadline: None,
            carried_flight: None,
            poller,
            commands: commands_rx,
            finished_tx,
            finished_rx,
        };
        tokio::spawn(task.run());

        AutoSaveHandle {
            commands: commands_tx,
        }
    }
}

/// Cloneable entry point used by the editor surface
///
/// Dropping every handle tears the session down: both timers are cancelled
/// and any save still in flight completes without touching state.
#[derive(Clone)]
pub struct AutoSaveHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl AutoSaveHandle {
    fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| Error::SchedulerClosed)
    }

    /// Record a content change and, when auto-save is active, restart the
    /// debounce timer. Never waits.
    pub fn mark_dirty(&self) -> Result<()> {
        self.send(Command::MarkDirty)
    }

    /// Save now, bypassing the debounce wait. A no-op while a save is in
    /// flight or after a conflict stopped the session.
    pub fn trigger_save(&self) -> Result<()> {
        self.send(Command::TriggerSave)
    }

    /// Switch to a different document identity, cancelling both timers and
    /// starting a clean session. Outcomes of saves from the previous identity
    /// are discarded.
    pub fn load_document(&self, document_id: Option<DocumentId>, version_token: i64) -> Result<()> {
        self.send(Command::LoadDocument {
            document_id,
            version_token,
        })
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Snapshot(reply_tx))?;
        reply_rx.await.map_err(|_| Error::SchedulerClosed)
    }

    /// End the session (editor unmounted)
    pub fn shutdown(&self) {
        self.send(Command::Shutdown).ok();
    }

    #[cfg(test)]
    pub(crate) fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }
}

struct SchedulerTask<T> {
    config: AutoSaveConfig,
    executor: SaveExecutor<T>,
    source: Arc<dyn ContentSource>,
    session: DraftSaveSession,
    debounce_deadline: Option<Instant>,
    /// Generation of a save still in flight for the same document across a
    /// reload; the current session holds the single-flight slot until it ends
    carried_flight: Option<u64>,
    poller: Interval,
    commands: mpsc::UnboundedReceiver<Command>,
    finished_tx: mpsc::UnboundedSender<SaveFinished>,
    finished_rx: mpsc::UnboundedReceiver<SaveFinished>,
}

impl<T: SaveTransport> SchedulerTask<T> {
    async fn run(mut self) {
        loop {
            let timers_active = self.timers_active();
            let debounce_deadline = self.debounce_deadline;

            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(finished) = self.finished_rx.recv() => self.handle_finished(finished),
                () = debounce_elapsed(debounce_deadline) => {
                    self.debounce_deadline = None;
                    tracing::debug!("Debounce timer fired");
                    self.start_timed_save();
                }
                _ = self.poller.tick(), if timers_active => self.check_max_wait(),
            }
        }

        tracing::debug!("Auto-save session ended; timers cancelled");
    }

    /// Timers run only for an identified, enabled, non-stopped session
    fn timers_active(&self) -> bool {
        self.config.enabled && self.session.document_id.is_some() && !self.session.stopped
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::MarkDirty => self.mark_dirty(),
            Command::TriggerSave => self.trigger_save(),
            Command::LoadDocument {
                document_id,
                version_token,
            } => self.load_document(document_id, version_token),
            Command::Snapshot(reply) => {
                reply.send(self.session.snapshot()).ok();
            }
            Command::Shutdown => {}
        }
    }

    fn mark_dirty(&mut self) {
        self.session.mark_dirty();
        if self.timers_active() {
            self.debounce_deadline = Some(Instant::now() + self.config.debounce());
            tracing::debug!("Debounce timer armed for {:?}", self.config.debounce());
        }
    }

    fn trigger_save(&mut self) {
        if self.session.stopped {
            tracing::debug!("Manual save ignored: session stopped after conflict");
            return;
        }
        if self.session.saving {
            tracing::debug!("Manual save ignored: a save is already in flight");
            return;
        }
        self.session.dirty = true;
        self.debounce_deadline = None;
        self.start_save();
    }

    fn load_document(&mut self, document_id: Option<DocumentId>, version_token: i64) {
        tracing::info!(
            "Loaded document {} at version {}",
            document_id
                .as_ref()
                .map_or_else(|| "(new)".to_string(), ToString::to_string),
            version_token
        );
        let carry = self.session.saving && self.session.document_id == document_id;
        let previous_generation = self.session.generation;
        self.session = self.session.next_generation(document_id, version_token);
        self.carried_flight = if carry {
            // The old request still holds the single-flight slot.
            self.session.saving = true;
            self.carried_flight.take().or(Some(previous_generation))
        } else {
            None
        };
        self.debounce_deadline = None;
        self.poller.reset();
        self.executor.report(&SaveStatus::Idle);
    }

    fn check_max_wait(&mut self) {
        if !self.session.dirty || self.session.saving {
            return;
        }
        let elapsed = Instant::now().saturating_duration_since(self.session.last_save_at);
        if elapsed >= self.config.max_wait() {
            tracing::info!(
                "Unsaved changes are {:?} old; forcing save",
                elapsed
            );
            self.debounce_deadline = None;
            self.start_timed_save();
        }
    }

    /// Timer-driven saves wait for an explicit `trigger_save` after a 401
    fn start_timed_save(&mut self) {
        if self.session.unauthorized {
            tracing::debug!("Timed save skipped: waiting for re-authentication");
            return;
        }
        self.start_save();
    }

    fn start_save(&mut self) {
        if !self.session.can_begin_save() {
            return;
        }
        let content = self.source.snapshot();
        let Some(ticket) = self.executor.begin(&mut self.session, content) else {
            return;
        };

        let executor = self.executor.clone();
        let finished_tx = self.finished_tx.clone();
        tokio::spawn(async move {
            let outcome = executor.run(ticket.request).await;
            // The scheduler may already be gone; its outcome no longer matters.
            finished_tx
                .send(SaveFinished {
                    attempt: ticket.attempt,
                    outcome,
                })
                .ok();
        });
    }

    fn handle_finished(&mut self, finished: SaveFinished) {
        let attempt = finished.attempt;
        match self
            .executor
            .apply(&mut self.session, finished.attempt, finished.outcome)
        {
            AfterSave::StopTimers => {
                self.debounce_deadline = None;
            }
            AfterSave::Continue => {
                // Edits that arrived mid-flight still need their own save.
                if self.session.edit_revision != attempt.revision {
                    self.rearm_debounce();
                }
            }
            AfterSave::Discarded => {
                if self.carried_flight == Some(attempt.generation) {
                    self.carried_flight = None;
                    self.session.saving = false;
                    self.rearm_debounce();
                }
            }
        }
    }

    fn rearm_debounce(&mut self) {
        if self.session.dirty
            && !self.session.unauthorized
            && self.debounce_deadline.is_none()
            && self.timers_active()
        {
            self.debounce_deadline = Some(Instant::now() + self.config.debounce());
        }
    }
}

async fn debounce_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}
