//! Crash-recovery reconciliation.
//!
//! On document load, compares the local backup's wall-clock write time with the
//! remote store's last update time. The remote time is expressed one million
//! times finer than milliseconds, so it is normalized before comparing. The
//! backup is written immediately before every save attempt, so a normal save
//! leaves the two times a few milliseconds apart; only a gap larger than the
//! tolerance window counts as unsaved local work.

use std::sync::Arc;

use crate::backup::BackupStore;
use crate::config::DEFAULT_RECOVERY_TOLERANCE_MS;
use crate::error::Result;
use crate::models::{DocumentId, RecoveryCandidate};

/// Remote update times are this many units per millisecond
pub const REMOTE_TIME_UNITS_PER_MS: i64 = 1_000_000;

/// Convert a remote update time to Unix milliseconds, flooring any
/// sub-millisecond remainder
pub const fn normalize_remote_time(remote_update_time: i64) -> i64 {
    remote_update_time.div_euclid(REMOTE_TIME_UNITS_PER_MS)
}

/// Decides whether a local backup represents work the remote store lacks
#[derive(Clone)]
pub struct RecoveryReconciler {
    store: Arc<dyn BackupStore>,
    tolerance_ms: i64,
}

impl RecoveryReconciler {
    pub fn new(store: Arc<dyn BackupStore>) -> Self {
        Self {
            store,
            tolerance_ms: DEFAULT_RECOVERY_TOLERANCE_MS,
        }
    }

    #[must_use]
    pub const fn with_tolerance_ms(mut self, tolerance_ms: i64) -> Self {
        self.tolerance_ms = tolerance_ms;
        self
    }

    pub const fn tolerance_ms(&self) -> i64 {
        self.tolerance_ms
    }

    /// Return the local backup if it is newer than the remote document by more
    /// than the tolerance window.
    ///
    /// An unreadable store is logged and treated like a missing backup.
    pub fn check_for_recovery(
        &self,
        document_id: &DocumentId,
        remote_update_time: i64,
    ) -> Option<RecoveryCandidate> {
        let backup = match self.store.read(document_id) {
            Ok(Some(backup)) => backup,
            Ok(None) => return None,
            Err(error) => {
                tracing::warn!("Failed to read local backup for {}: {}", document_id, error);
                return None;
            }
        };

        let remote_ms = normalize_remote_time(remote_update_time);
        let diff = backup.written_at_local_ms.saturating_sub(remote_ms);
        if diff > self.tolerance_ms {
            tracing::info!(
                "Local backup for {} is {}ms newer than the remote copy; offering recovery",
                document_id,
                diff
            );
            Some(backup.into())
        } else {
            tracing::debug!(
                "Local backup for {} is within tolerance ({}ms)",
                document_id,
                diff
            );
            None
        }
    }

    /// Remove the backup after the user discards a recovery offer or the
    /// content has been reconciled
    pub fn clear_backup(&self, document_id: &DocumentId) -> Result<()> {
        self.store.clear(document_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::MemoryBackupStore;
    use pretty_assertions::assert_eq;

    const REMOTE: i64 = 1_707_800_000_000_000_000;

    fn doc() -> DocumentId {
        DocumentId::new("event-7").unwrap()
    }

    fn reconciler_with(store: &Arc<MemoryBackupStore>) -> RecoveryReconciler {
        RecoveryReconciler::new(store.clone())
    }

    #[test]
    fn normalize_divides_by_scale() {
        assert_eq!(normalize_remote_time(REMOTE), 1_707_800_000_000);
    }

    #[test]
    fn normalize_floors_instead_of_rounding() {
        assert_eq!(normalize_remote_time(1_500_000), 1);
        assert_eq!(normalize_remote_time(1_999_999), 1);
        assert_eq!(normalize_remote_time(999_999), 0);
    }

    #[test]
    fn backup_within_tolerance_is_not_offered() {
        let store = Arc::new(MemoryBackupStore::new());
        store
            .write_at(&doc(), "draft", normalize_remote_time(REMOTE) + 3_000)
            .unwrap();

        assert_eq!(reconciler_with(&store).check_for_recovery(&doc(), REMOTE), None);
    }

    #[test]
    fn backup_beyond_tolerance_is_offered() {
        let store = Arc::new(MemoryBackupStore::new());
        let written_at = normalize_remote_time(REMOTE) + 10_000;
        store.write_at(&doc(), "unsaved work", written_at).unwrap();

        assert_eq!(
            reconciler_with(&store).check_for_recovery(&doc(), REMOTE),
            Some(RecoveryCandidate {
                body: "unsaved work".to_string(),
                written_at_local_ms: written_at,
            })
        );
    }

    #[test]
    fn exact_tolerance_boundary_is_not_offered() {
        let store = Arc::new(MemoryBackupStore::new());
        store
            .write_at(&doc(), "draft", normalize_remote_time(REMOTE) + 5_000)
            .unwrap();

        assert_eq!(reconciler_with(&store).check_for_recovery(&doc(), REMOTE), None);
    }

    #[test]
    fn older_backup_is_not_offered() {
        let store = Arc::new(MemoryBackupStore::new());
        store
            .write_at(&doc(), "stale", normalize_remote_time(REMOTE) - 60_000)
            .unwrap();

        assert_eq!(reconciler_with(&store).check_for_recovery(&doc(), REMOTE), None);
    }

    #[test]
    fn missing_or_malformed_backup_is_not_offered() {
        let store = Arc::new(MemoryBackupStore::new());
        let reconciler = reconciler_with(&store);
        assert_eq!(reconciler.check_for_recovery(&doc(), REMOTE), None);

        store.insert_raw(doc().backup_key(), r#"{"body":"x","timestamp":"nope"}"#);
        assert_eq!(reconciler.check_for_recovery(&doc(), REMOTE), None);
    }

    #[test]
    fn custom_tolerance_is_respected() {
        let store = Arc::new(MemoryBackupStore::new());
        store
            .write_at(&doc(), "draft", normalize_remote_time(REMOTE) + 3_000)
            .unwrap();

        let reconciler = reconciler_with(&store).with_tolerance_ms(1_000);
        assert!(reconciler.check_for_recovery(&doc(), REMOTE).is_some());
    }

    #[test]
    fn clear_backup_removes_record_and_tolerates_missing() {
        let store = Arc::new(MemoryBackupStore::new());
        let reconciler = reconciler_with(&store);
        store.write_at(&doc(), "draft", 1).unwrap();

        reconciler.clear_backup(&doc()).unwrap();
        assert_eq!(store.read(&doc()).unwrap(), None);
        reconciler.clear_backup(&doc()).unwrap();
    }
}
