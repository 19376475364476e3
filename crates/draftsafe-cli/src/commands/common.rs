use std::io::{self, IsTerminal, Read};
use std::path::Path;

use chrono::{Local, TimeZone};
use draftsafe_core::backup::SqliteBackupStore;
use draftsafe_core::{DocumentId, LocalBackup};
use serde::Serialize;

use crate::error::CliError;

const PREVIEW_CHARS: usize = 60;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct BackupListItem {
    pub document_id: String,
    pub timestamp: i64,
    pub written_at: String,
    pub bytes: usize,
    pub preview: String,
}

pub fn open_backup_store(db_path: &Path) -> Result<SqliteBackupStore, CliError> {
    tracing::debug!("Opening backup store at {}", db_path.display());
    Ok(SqliteBackupStore::open(db_path)?)
}

pub fn parse_document_id(raw: &str) -> Result<DocumentId, CliError> {
    Ok(DocumentId::new(raw)?)
}

/// Read content from a file, or from stdin when it is not a terminal
pub fn read_content(file: Option<&Path>) -> Result<String, CliError> {
    if let Some(path) = file {
        return Ok(std::fs::read_to_string(path)?);
    }

    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        return Err(CliError::EmptyContent);
    }
    let mut content = String::new();
    stdin.read_to_string(&mut content)?;
    Ok(content)
}

pub fn format_local_millis(millis: i64) -> String {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map_or_else(
            || format!("{millis}ms"),
            |time| time.format("%Y-%m-%d %H:%M:%S").to_string(),
        )
}

pub fn backup_preview(body: &str) -> String {
    let compact = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if compact.chars().count() <= PREVIEW_CHARS {
        return compact;
    }
    let mut preview = compact.chars().take(PREVIEW_CHARS - 3).collect::<String>();
    preview.push_str("...");
    preview
}

pub fn backup_to_item(document_id: &DocumentId, backup: &LocalBackup) -> BackupListItem {
    BackupListItem {
        document_id: document_id.to_string(),
        timestamp: backup.written_at_local_ms,
        written_at: format_local_millis(backup.written_at_local_ms),
        bytes: backup.body.len(),
        preview: backup_preview(&backup.body),
    }
}

pub fn format_backup_lines(backups: &[(DocumentId, LocalBackup)]) -> Vec<String> {
    backups
        .iter()
        .map(|(document_id, backup)| {
            format!(
                "{}  {}  {}",
                document_id,
                format_local_millis(backup.written_at_local_ms),
                backup_preview(&backup.body)
            )
        })
        .collect()
}
