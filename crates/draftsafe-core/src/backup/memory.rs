//! In-memory backup store

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{sort_newest_first, BackupStore};
use crate::error::{Error, Result};
use crate::models::{DocumentId, LocalBackup};

/// Process-local backup store keyed by [`DocumentId::backup_key`]
///
/// Records are kept in their encoded form so reads go through the same
/// malformed-record handling as persistent stores. An optional byte quota
/// makes writes fail the way a full browser or disk store would.
#[derive(Debug, Default)]
pub struct MemoryBackupStore {
    records: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryBackupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects writes once stored payloads exceed `quota_bytes`
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Store a raw payload under a key, bypassing encoding
    #[cfg(test)]
    pub(crate) fn insert_raw(&self, key: impl Into<String>, payload: impl Into<String>) {
        self.records().insert(key.into(), payload.into());
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.records().len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.records().is_empty()
    }

    fn records(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl BackupStore for MemoryBackupStore {
    fn write_at(
        &self,
        document_id: &DocumentId,
        body: &str,
        written_at_local_ms: i64,
    ) -> Result<()> {
        let key = document_id.backup_key();
        let payload = LocalBackup::new(body, written_at_local_ms).encode()?;
        let mut records = self.records();

        if let Some(quota) = self.quota_bytes {
            let others: usize = records
                .iter()
                .filter(|(existing, _)| **existing != key)
                .map(|(_, stored)| stored.len())
                .sum();
            if others + payload.len() > quota {
                return Err(Error::Storage(format!(
                    "backup quota of {quota} bytes exceeded"
                )));
            }
        }

        records.insert(key, payload);
        Ok(())
    }

    fn read(&self, document_id: &DocumentId) -> Result<Option<LocalBackup>> {
        Ok(self
            .records()
            .get(&document_id.backup_key())
            .and_then(|raw| LocalBackup::decode(raw)))
    }

    fn clear(&self, document_id: &DocumentId) -> Result<()> {
        self.records().remove(&document_id.backup_key());
        Ok(())
    }

    fn list(&self) -> Result<Vec<(DocumentId, LocalBackup)>> {
        let mut backups = self
            .records()
            .iter()
            .filter_map(|(key, raw)| {
                Some((DocumentId::from_backup_key(key)?, LocalBackup::decode(raw)?))
            })
            .collect::<Vec<_>>();
        sort_newest_first(&mut backups);
        Ok(backups)
    }
}
