use std::sync::Arc;

use draftsafe_core::recovery::{normalize_remote_time, RecoveryReconciler};
use draftsafe_core::{DocumentId, RecoveryCandidate};
use serde::Serialize;

use crate::commands::common::{format_local_millis, open_backup_store, parse_document_id};
use crate::config::Settings;
use crate::error::CliError;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RecoveryReport {
    pub document_id: String,
    pub recovery_available: bool,
    pub remote_updated_at_ms: i64,
    pub tolerance_ms: i64,
    pub backup_timestamp: Option<i64>,
    pub newer_by_ms: Option<i64>,
    pub body: Option<String>,
    pub discarded: bool,
}

pub fn build_report(
    document_id: &DocumentId,
    remote_update_time: i64,
    tolerance_ms: i64,
    candidate: Option<RecoveryCandidate>,
    discarded: bool,
) -> RecoveryReport {
    let remote_updated_at_ms = normalize_remote_time(remote_update_time);
    RecoveryReport {
        document_id: document_id.to_string(),
        recovery_available: candidate.is_some(),
        remote_updated_at_ms,
        tolerance_ms,
        backup_timestamp: candidate.as_ref().map(|c| c.written_at_local_ms),
        newer_by_ms: candidate
            .as_ref()
            .map(|c| c.written_at_local_ms.saturating_sub(remote_updated_at_ms)),
        body: candidate.map(|c| c.body),
        discarded,
    }
}

pub fn run_recover(
    id: &str,
    remote_update_time: i64,
    as_json: bool,
    discard: bool,
    settings: &Settings,
) -> Result<(), CliError> {
    let document_id = parse_document_id(id)?;
    let store = Arc::new(open_backup_store(&settings.db_path)?);
    let reconciler =
        RecoveryReconciler::new(store).with_tolerance_ms(settings.autosave.recovery_tolerance_ms);

    let candidate = reconciler.check_for_recovery(&document_id, remote_update_time);
    let discarded = discard && candidate.is_some();
    if discarded {
        reconciler.clear_backup(&document_id)?;
    }

    let report = build_report(
        &document_id,
        remote_update_time,
        reconciler.tolerance_ms(),
        candidate,
        discarded,
    );

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for line in format_report_lines(&report) {
        println!("{line}");
    }
    Ok(())
}

pub fn format_report_lines(report: &RecoveryReport) -> Vec<String> {
    let (Some(timestamp), Some(newer_by_ms)) = (report.backup_timestamp, report.newer_by_ms)
    else {
        return vec![format!(
            "No recovery needed for {}: remote copy is current.",
            report.document_id
        )];
    };

    let mut lines = vec![format!(
        "Unsaved local changes found for {} (written {}, {}ms newer than remote).",
        report.document_id,
        format_local_millis(timestamp),
        newer_by_ms
    )];
    if report.discarded {
        lines.push("Local backup discarded.".to_string());
    } else if let Some(body) = &report.body {
        lines.push(String::new());
        lines.push(body.clone());
    }
    lines
}
