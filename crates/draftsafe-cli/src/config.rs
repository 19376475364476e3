//! Persistent CLI configuration.

use std::path::{Path, PathBuf};

use draftsafe_core::util::{is_http_url, normalize_text_option};
use draftsafe_core::AutoSaveConfig;
use serde::{Deserialize, Serialize};

use crate::error::CliError;

const CONFIG_FILE_NAME: &str = "config.json";
const DEFAULT_DB_FILE_NAME: &str = "backups.db";

pub const ENV_DB_PATH: &str = "DRAFTSAFE_DB_PATH";
pub const ENV_API_BASE_URL: &str = "DRAFTSAFE_API_BASE_URL";
pub const ENV_API_TOKEN: &str = "DRAFTSAFE_API_TOKEN";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliConfig {
    #[serde(default)]
    pub autosave: AutoSaveConfig,
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub backup_db_path: Option<PathBuf>,
}

/// Configuration after file, environment, and flag overrides
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub autosave: AutoSaveConfig,
    pub db_path: PathBuf,
    pub api_base_url: Option<String>,
    pub api_token: Option<String>,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("draftsafe").join(CONFIG_FILE_NAME))
}

pub fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("draftsafe")
        .join(DEFAULT_DB_FILE_NAME)
}

impl CliConfig {
    pub fn load_from_path(path: &Path) -> Result<Self, CliError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|error| {
            CliError::Config(format!(
                "Failed to read config at {}: {}",
                path.display(),
                error
            ))
        })?;
        let mut config = serde_json::from_str::<Self>(&raw).map_err(|error| {
            CliError::Config(format!(
                "Failed to parse config at {}: {}",
                path.display(),
                error
            ))
        })?;
        config.normalize();
        config
            .autosave
            .validate()
            .map_err(|error| CliError::Config(format!("{}: {}", path.display(), error)))?;
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), CliError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                CliError::Config(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                ))
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)?;
        std::fs::write(path, serialized).map_err(|error| {
            CliError::Config(format!(
                "Failed to write config at {}: {}",
                path.display(),
                error
            ))
        })
    }

    fn normalize(&mut self) {
        self.api_base_url = normalize_text_option(self.api_base_url.take());
        if self
            .backup_db_path
            .as_ref()
            .is_some_and(|path| path.as_os_str().is_empty())
        {
            self.backup_db_path = None;
        }
    }
}

/// Resolve effective settings: explicit flag, then environment, then file,
/// then platform defaults
pub fn resolve_settings(
    config: CliConfig,
    explicit_db_path: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Settings, CliError> {
    let db_path = explicit_db_path
        .or_else(|| normalize_text_option(env(ENV_DB_PATH)).map(PathBuf::from))
        .or(config.backup_db_path)
        .unwrap_or_else(default_db_path);

    let api_base_url = normalize_text_option(env(ENV_API_BASE_URL)).or(config.api_base_url);
    if let Some(url) = &api_base_url {
        normalize_api_base_url(url)?;
    }

    Ok(Settings {
        autosave: config.autosave,
        db_path,
        api_base_url,
        api_token: normalize_text_option(env(ENV_API_TOKEN)),
    })
}

pub fn normalize_api_base_url(raw: &str) -> Result<String, CliError> {
    let value = raw.trim();
    if is_http_url(value) {
        Ok(value.trim_end_matches('/').to_string())
    } else {
        Err(CliError::Config(
            "API base URL must include http:// or https://".to_string(),
        ))
    }
}
