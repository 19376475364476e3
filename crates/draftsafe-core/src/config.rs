//! Auto-save configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Quiet period after the last edit before a save fires.
pub const DEFAULT_DEBOUNCE_MS: u64 = 60_000;
/// Ceiling on how long dirty content may stay unsaved.
pub const DEFAULT_MAX_WAIT_MS: u64 = 300_000;
/// Cadence of the max-wait poller.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10_000;
/// Local-vs-remote skew treated as the same save.
pub const DEFAULT_RECOVERY_TOLERANCE_MS: i64 = 5_000;

/// Options recognised by the auto-save scheduler and recovery reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutoSaveConfig {
    /// `false` disables timer-driven saves entirely (manual saves still run)
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_recovery_tolerance_ms")]
    pub recovery_tolerance_ms: i64,
}

const fn default_enabled() -> bool {
    true
}

const fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

const fn default_max_wait_ms() -> u64 {
    DEFAULT_MAX_WAIT_MS
}

const fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

const fn default_recovery_tolerance_ms() -> i64 {
    DEFAULT_RECOVERY_TOLERANCE_MS
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            max_wait_ms: DEFAULT_MAX_WAIT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            recovery_tolerance_ms: DEFAULT_RECOVERY_TOLERANCE_MS,
        }
    }
}

impl AutoSaveConfig {
    /// Create a configuration with timer-driven saves switched off
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce_ms = duration_to_ms(debounce);
        self
    }

    #[must_use]
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait_ms = duration_to_ms(max_wait);
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = duration_to_ms(interval);
        self
    }

    #[must_use]
    pub const fn with_recovery_tolerance_ms(mut self, tolerance_ms: i64) -> Self {
        self.recovery_tolerance_ms = tolerance_ms;
        self
    }

    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub const fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Reject configurations the scheduler cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.debounce_ms == 0 {
            return Err(Error::InvalidInput(
                "debounce_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_wait_ms == 0 {
            return Err(Error::InvalidInput(
                "max_wait_ms must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::InvalidInput(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.recovery_tolerance_ms < 0 {
            return Err(Error::InvalidInput(
                "recovery_tolerance_ms must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
