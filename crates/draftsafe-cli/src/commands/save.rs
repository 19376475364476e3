use std::path::Path;
use std::sync::Arc;

use draftsafe_core::models::watch_status;
use draftsafe_core::transport::HttpSaveTransport;
use draftsafe_core::{AutoSaveScheduler, SaveStatus};

use crate::commands::common::{open_backup_store, parse_document_id, read_content};
use crate::config::Settings;
use crate::error::CliError;

pub async fn run_save(
    id: &str,
    version_token: i64,
    file: Option<&Path>,
    settings: &Settings,
) -> Result<(), CliError> {
    let document_id = parse_document_id(id)?;
    let base_url = settings
        .api_base_url
        .clone()
        .ok_or(CliError::ApiNotConfigured)?;
    let content = read_content(file)?;

    let transport =
        HttpSaveTransport::new(base_url)?.with_bearer_token(settings.api_token.clone());
    let backups = Arc::new(open_backup_store(&settings.db_path)?);

    let (sink, mut status_rx) = watch_status();

    let scheduler = AutoSaveScheduler::new(
        settings.autosave,
        transport,
        backups,
        move || content.clone(),
        sink,
    )?;
    let handle = scheduler.spawn(Some(document_id.clone()), version_token);
    handle.trigger_save()?;

    // Fast transitions may coalesce; the terminal status is always observed.
    let mut final_status = None;
    while status_rx.changed().await.is_ok() {
        let status = status_rx.borrow_and_update().clone();
        if let Some(line) = format_status_line(&status) {
            println!("{line}");
        }
        if is_final(&status) {
            final_status = Some(status);
            break;
        }
    }

    let snapshot = handle.snapshot().await?;
    handle.shutdown();

    match final_status {
        Some(SaveStatus::Saved { .. }) => {
            println!(
                "Saved {} (new version token {})",
                document_id, snapshot.expected_version_token
            );
            Ok(())
        }
        Some(status) => Err(CliError::SaveFailed(
            status
                .display_message()
                .unwrap_or_else(|| format!("{:?}", status.kind())),
        )),
        None => Err(CliError::SaveFailed(
            "scheduler stopped before reporting a result".to_string(),
        )),
    }
}

pub const fn is_final(status: &SaveStatus) -> bool {
    !matches!(status, SaveStatus::Idle | SaveStatus::Saving)
}

pub fn format_status_line(status: &SaveStatus) -> Option<String> {
    status
        .display_message()
        .map(|message| format!("[{}] {}", status_label(status), message))
}

fn status_label(status: &SaveStatus) -> &'static str {
    match status {
        SaveStatus::Idle => "idle",
        SaveStatus::Saving => "saving",
        SaveStatus::Saved { .. } => "saved",
        SaveStatus::Error { .. } => "error",
        SaveStatus::Stale { .. } => "stale",
        SaveStatus::Unauthorized => "unauthorized",
    }
}
