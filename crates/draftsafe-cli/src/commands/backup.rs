use std::path::Path;

use draftsafe_core::backup::BackupStore;

use crate::cli::BackupCommands;
use crate::commands::common::{
    backup_to_item, format_backup_lines, format_local_millis, open_backup_store,
    parse_document_id, read_content, BackupListItem,
};
use crate::error::CliError;

pub fn run_backup(command: BackupCommands, db_path: &Path) -> Result<(), CliError> {
    match command {
        BackupCommands::List { json } => run_backup_list(json, db_path),
        BackupCommands::Show { id, json } => run_backup_show(&id, json, db_path),
        BackupCommands::Write { id, file } => run_backup_write(&id, file.as_deref(), db_path),
        BackupCommands::Clear { id } => run_backup_clear(&id, db_path),
    }
}

pub fn run_backup_list(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let store = open_backup_store(db_path)?;
    let backups = store.list()?;

    if as_json {
        let items = backups
            .iter()
            .map(|(document_id, backup)| backup_to_item(document_id, backup))
            .collect::<Vec<BackupListItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if backups.is_empty() {
        println!("No local backups.");
        return Ok(());
    }

    for line in format_backup_lines(&backups) {
        println!("{line}");
    }
    Ok(())
}

pub fn run_backup_show(id: &str, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let document_id = parse_document_id(id)?;
    let store = open_backup_store(db_path)?;
    let backup = store
        .read(&document_id)?
        .ok_or_else(|| CliError::BackupNotFound(document_id.to_string()))?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&backup)?);
    } else {
        println!(
            "# {} (written {})",
            document_id,
            format_local_millis(backup.written_at_local_ms)
        );
        println!("{}", backup.body);
    }
    Ok(())
}

pub fn run_backup_write(id: &str, file: Option<&Path>, db_path: &Path) -> Result<(), CliError> {
    let document_id = parse_document_id(id)?;
    let content = read_content(file)?;
    let store = open_backup_store(db_path)?;
    let backup = store.write(&document_id, &content)?;

    println!(
        "Wrote backup for {} ({} bytes) at {}",
        document_id,
        backup.body.len(),
        format_local_millis(backup.written_at_local_ms)
    );
    Ok(())
}

pub fn run_backup_clear(id: &str, db_path: &Path) -> Result<(), CliError> {
    let document_id = parse_document_id(id)?;
    let store = open_backup_store(db_path)?;
    store.clear(&document_id)?;
    println!("Cleared backup for {document_id}");
    Ok(())
}
