//! Local backup persistence
//!
//! One overwrite-in-place record per document identity. Backups are advisory:
//! callers on the save path swallow write failures, and reads treat malformed
//! records as absent.

mod memory;
mod sqlite;

pub use memory::MemoryBackupStore;
pub use sqlite::SqliteBackupStore;

use crate::error::Result;
use crate::models::{DocumentId, LocalBackup};
use crate::util::unix_millis_now;

/// Trait for local backup storage operations
pub trait BackupStore: Send + Sync + 'static {
    /// Write a backup stamped with an explicit local write time, replacing
    /// any previous backup for the document
    fn write_at(&self, document_id: &DocumentId, body: &str, written_at_local_ms: i64)
        -> Result<()>;

    /// Read the backup for a document; missing or malformed records are `None`
    fn read(&self, document_id: &DocumentId) -> Result<Option<LocalBackup>>;

    /// Remove the backup for a document; a missing record is not an error
    fn clear(&self, document_id: &DocumentId) -> Result<()>;

    /// List every readable backup, newest first
    fn list(&self) -> Result<Vec<(DocumentId, LocalBackup)>>;

    /// Write a backup stamped with the current wall-clock time
    fn write(&self, document_id: &DocumentId, body: &str) -> Result<LocalBackup> {
        let written_at_local_ms = unix_millis_now();
        self.write_at(document_id, body, written_at_local_ms)?;
        Ok(LocalBackup::new(body, written_at_local_ms))
    }
}

fn sort_newest_first(backups: &mut [(DocumentId, LocalBackup)]) {
    backups.sort_by(|(left_id, left), (right_id, right)| {
        right
            .written_at_local_ms
            .cmp(&left.written_at_local_ms)
            .then_with(|| left_id.cmp(right_id))
    });
}
