//! Workflow configuration with TOML file support.

use keylink_verification::DEFAULT_MIN_DURATION;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::logging::LogFormat;
use crate::WorkflowError;

/// Configuration for a linking workflow.
///
/// Can be loaded from a TOML file via [`WorkflowConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Minimum perceived duration of a verification attempt, in milliseconds.
    /// May be raised above 1000 but never lowered below it.
    #[serde(default = "default_min_verify_duration_ms")]
    pub min_verify_duration_ms: u64,

    /// Capacity of the channel carrying worker results to the controller.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Title shown on the progress indicator while submitting.
    #[serde(default = "default_progress_title")]
    pub progress_title: String,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_min_verify_duration_ms() -> u64 {
    DEFAULT_MIN_DURATION.as_millis() as u64
}

fn default_event_capacity() -> usize {
    32
}

fn default_progress_title() -> String {
    "Saving key…".to_string()
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl WorkflowConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, WorkflowError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| WorkflowError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, WorkflowError> {
        let config: Self = toml::from_str(s).map_err(|e| WorkflowError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, WorkflowError> {
        toml::to_string_pretty(self).map_err(|e| WorkflowError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), WorkflowError> {
        if self.min_verify_duration() < DEFAULT_MIN_DURATION {
            return Err(WorkflowError::Config(format!(
                "min_verify_duration_ms must be at least {}",
                DEFAULT_MIN_DURATION.as_millis()
            )));
        }
        if self.event_capacity == 0 {
            return Err(WorkflowError::Config(
                "event_capacity must be at least 1".into(),
            ));
        }
        self.log_format()?;
        Ok(())
    }

    pub fn min_verify_duration(&self) -> Duration {
        Duration::from_millis(self.min_verify_duration_ms)
    }

    pub fn log_format(&self) -> Result<LogFormat, WorkflowError> {
        self.log_format.parse()
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            min_verify_duration_ms: default_min_verify_duration_ms(),
            event_capacity: default_event_capacity(),
            progress_title: default_progress_title(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
