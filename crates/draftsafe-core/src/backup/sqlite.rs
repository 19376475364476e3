//! `SQLite` backup store

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::{params, Connection, OptionalExtension};

use super::{sort_newest_first, BackupStore};
use crate::error::Result;
use crate::models::{DocumentId, LocalBackup};

/// Current schema version
const CURRENT_VERSION: i32 = 1;

/// Backup store persisted in a local `SQLite` file
///
/// Each row holds the encoded `{ "body", "timestamp" }` payload under the
/// document's backup key, so a record survives a crash of the editing process.
pub struct SqliteBackupStore {
    conn: Mutex<Connection>,
}

impl SqliteBackupStore {
    /// Open a store at the given path, creating it if it doesn't exist
    ///
    /// Runs migrations automatically.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// Open an in-memory store (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        // WAL is unavailable for in-memory databases
        conn.pragma_update(None, "journal_mode", "WAL").ok();
        conn.pragma_update(None, "synchronous", "NORMAL").ok();
        migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a raw payload under a key, bypassing encoding
    pub(crate) fn insert_raw(&self, key: &str, payload: &str) -> Result<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO draft_backups (key, payload) VALUES (?, ?)",
            params![key, payload],
        )?;
        Ok(())
    }
}

impl BackupStore for SqliteBackupStore {
    fn write_at(
        &self,
        document_id: &DocumentId,
        body: &str,
        written_at_local_ms: i64,
    ) -> Result<()> {
        let payload = LocalBackup::new(body, written_at_local_ms).encode()?;
        self.insert_raw(&document_id.backup_key(), &payload)
    }

    fn read(&self, document_id: &DocumentId) -> Result<Option<LocalBackup>> {
        let payload: Option<String> = self
            .conn()
            .query_row(
                "SELECT payload FROM draft_backups WHERE key = ?",
                params![document_id.backup_key()],
                |row| row.get(0),
            )
            .optional()?;

        Ok(payload.and_then(|raw| LocalBackup::decode(&raw)))
    }

    fn clear(&self, document_id: &DocumentId) -> Result<()> {
        self.conn().execute(
            "DELETE FROM draft_backups WHERE key = ?",
            params![document_id.backup_key()],
        )?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<(DocumentId, LocalBackup)>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT key, payload FROM draft_backups")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut backups = rows
            .into_iter()
            .filter_map(|(key, raw)| {
                Some((DocumentId::from_backup_key(&key)?, LocalBackup::decode(&raw)?))
            })
            .collect::<Vec<_>>();
        sort_newest_first(&mut backups);
        Ok(backups)
    }
}

/// Run all pending migrations
fn migrate(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    if version < 1 {
        conn.execute_batch(
            "BEGIN;
             CREATE TABLE IF NOT EXISTS draft_backups (
                 key TEXT PRIMARY KEY,
                 payload TEXT NOT NULL
             );
             INSERT INTO schema_version (version) VALUES (1);
             COMMIT;",
        )?;
        tracing::info!("Migrated backup store to version {CURRENT_VERSION}");
    }

    Ok(())
}
