//! Local backup and recovery candidate models

use serde::{Deserialize, Serialize};

/// Best-effort snapshot of in-progress content for one document
///
/// Serialized as `{ "body": ..., "timestamp": ... }`; `timestamp` is the local
/// wall-clock write time in Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalBackup {
    /// Full serialized content snapshot
    pub body: String,
    /// Wall-clock milliseconds when the backup was written
    #[serde(rename = "timestamp")]
    pub written_at_local_ms: i64,
}

impl LocalBackup {
    pub fn new(body: impl Into<String>, written_at_local_ms: i64) -> Self {
        Self {
            body: body.into(),
            written_at_local_ms,
        }
    }

    /// Decode a stored payload, treating anything malformed as absent.
    ///
    /// A payload needs a string `body` and a numeric `timestamp`; fractional
    /// timestamps are floored to whole milliseconds.
    pub fn decode(raw: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(raw).ok()?;
        let body = value.get("body")?.as_str()?.to_string();
        let timestamp = value.get("timestamp")?;
        let written_at_local_ms = match timestamp.as_i64() {
            Some(ms) => ms,
            None => float_millis(timestamp.as_f64()?)?,
        };
        Some(Self {
            body,
            written_at_local_ms,
        })
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn float_millis(value: f64) -> Option<i64> {
    if !value.is_finite() || value.abs() >= 9.0e15 {
        return None;
    }
    Some(value.floor() as i64)
}

/// Local backup judged to hold work newer than the remote document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryCandidate {
    pub body: String,
    pub written_at_local_ms: i64,
}

impl From<LocalBackup> for RecoveryCandidate {
    fn from(backup: LocalBackup) -> Self {
        Self {
            body: backup.body,
            written_at_local_ms: backup.written_at_local_ms,
        }
    }
}
