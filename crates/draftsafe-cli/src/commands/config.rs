use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::cli::ConfigCommands;
use crate::config::{normalize_api_base_url, CliConfig, Settings};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct SettingsView<'a> {
    config_path: Option<&'a Path>,
    db_path: &'a Path,
    api_base_url: Option<&'a str>,
    api_token: Option<&'static str>,
    autosave: draftsafe_core::AutoSaveConfig,
}

pub fn run_config(
    command: ConfigCommands,
    config_path: Option<&Path>,
    settings: &Settings,
) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show { json } => run_config_show(json, config_path, settings),
        ConfigCommands::Init {
            api_base_url,
            backup_db_path,
        } => {
            let path = config_path.ok_or_else(|| {
                CliError::Config("Failed to resolve CLI config directory".to_string())
            })?;
            run_config_init(path, api_base_url, backup_db_path)
        }
    }
}

pub fn run_config_show(
    as_json: bool,
    config_path: Option<&Path>,
    settings: &Settings,
) -> Result<(), CliError> {
    let view = SettingsView {
        config_path,
        db_path: &settings.db_path,
        api_base_url: settings.api_base_url.as_deref(),
        api_token: settings.api_token.as_ref().map(|_| "[REDACTED]"),
        autosave: settings.autosave,
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!(
        "Config file: {}",
        config_path.map_or_else(|| "(none)".to_string(), |path| path.display().to_string())
    );
    println!("Backup database: {}", settings.db_path.display());
    println!(
        "API base URL: {}",
        settings.api_base_url.as_deref().unwrap_or("(not set)")
    );
    println!(
        "API token: {}",
        if settings.api_token.is_some() {
            "set"
        } else {
            "not set"
        }
    );
    let autosave = &settings.autosave;
    println!(
        "Auto-save: {} (debounce {}ms, max wait {}ms, poll {}ms, recovery tolerance {}ms)",
        if autosave.enabled { "enabled" } else { "disabled" },
        autosave.debounce_ms,
        autosave.max_wait_ms,
        autosave.poll_interval_ms,
        autosave.recovery_tolerance_ms
    );
    Ok(())
}

pub fn run_config_init(
    path: &Path,
    api_base_url: Option<String>,
    backup_db_path: Option<PathBuf>,
) -> Result<(), CliError> {
    let mut config = CliConfig::load_from_path(path)?;
    if let Some(url) = api_base_url {
        config.api_base_url = Some(normalize_api_base_url(&url)?);
    }
    if let Some(db_path) = backup_db_path {
        config.backup_db_path = Some(db_path);
    }

    config.save_to_path(path)?;
    println!("Saved config to {}", path.display());
    Ok(())
}
