//! Save status reported to the UI layer

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::watch;

/// Status pushed to the status sink on every state transition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved { at: DateTime<Local> },
    Error { message: String },
    /// Terminal: another session updated the document
    Stale { message: String },
    Unauthorized,
}

/// Payload-free discriminant of [`SaveStatus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Idle,
    Saving,
    Saved,
    Error,
    Stale,
    Unauthorized,
}

impl SaveStatus {
    pub const fn kind(&self) -> StatusKind {
        match self {
            Self::Idle => StatusKind::Idle,
            Self::Saving => StatusKind::Saving,
            Self::Saved { .. } => StatusKind::Saved,
            Self::Error { .. } => StatusKind::Error,
            Self::Stale { .. } => StatusKind::Stale,
            Self::Unauthorized => StatusKind::Unauthorized,
        }
    }

    /// Human-readable message for status indicators, if the status has one
    pub fn display_message(&self) -> Option<String> {
        match self {
            Self::Idle => None,
            Self::Saving => Some("Saving...".to_string()),
            Self::Saved { at } => Some(format!("Saved at {}", at.format("%H:%M:%S"))),
            Self::Error { message } => Some(format!("Auto-save failed: {message}")),
            Self::Stale { message } => Some(format!(
                "This document was changed elsewhere. Reload to continue editing. ({message})"
            )),
            Self::Unauthorized => {
                Some("Your session expired. Sign in again to keep saving.".to_string())
            }
        }
    }
}

/// Receives every status transition; used for rendering only, never read back
pub trait StatusSink: Send + Sync + 'static {
    fn report(&self, status: &SaveStatus);
}

impl<F> StatusSink for F
where
    F: Fn(&SaveStatus) + Send + Sync + 'static,
{
    fn report(&self, status: &SaveStatus) {
        self(status);
    }
}

/// Status sink publishing into a `watch` channel, plus its receiver
pub fn watch_status() -> (impl StatusSink, watch::Receiver<SaveStatus>) {
    let (sender, receiver) = watch::channel(SaveStatus::Idle);
    let sink = move |status: &SaveStatus| {
        sender.send_replace(status.clone());
    };
    (sink, receiver)
}
