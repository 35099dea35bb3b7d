// src/config/settings.rs

use std::time::Duration;

use serde::Deserialize;

use crate::errors::{Result, WfBenchError};
use crate::exec::retry::RetryPolicy;
use crate::types::ScheduleMode;

/// Default endpoint of the `local` platform worker.
pub const DEFAULT_LOCAL_ENDPOINT: &str = "http://localhost:80/wfbench";

/// Optional runner settings, read from TOML.
///
/// ```toml
/// [driver]
/// poll_interval_ms = 1000
/// readiness_timeout_secs = 600
/// request_timeout_secs = 300
/// schedule = "levels"
///
/// [retry]
/// max_retries = 3
/// initial_delay_ms = 500
/// max_delay_ms = 8000
/// multiplier = 2.0
///
/// [local]
/// endpoint = "http://localhost:80/wfbench"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunnerSettings {
    #[serde(default)]
    pub driver: DriverSection,

    #[serde(default)]
    pub retry: RetrySection,

    #[serde(default)]
    pub local: LocalSection,
}

/// `[driver]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct DriverSection {
    /// Interval between two readiness checks of the same task.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound on how long a task may wait for its inputs.
    #[serde(default = "default_readiness_timeout_secs")]
    pub readiness_timeout_secs: u64,

    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub schedule: ScheduleMode,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_readiness_timeout_secs() -> u64 {
    600
}

fn default_request_timeout_secs() -> u64 {
    300
}

impl Default for DriverSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            readiness_timeout_secs: default_readiness_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            schedule: ScheduleMode::default(),
        }
    }
}

/// `[retry]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySection {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    8000
}

fn default_multiplier() -> f64 {
    2.0
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
        }
    }
}

impl RetrySection {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            multiplier: self.multiplier,
        }
    }
}

/// `[local]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalSection {
    #[serde(default = "default_local_endpoint")]
    pub endpoint: String,
}

fn default_local_endpoint() -> String {
    DEFAULT_LOCAL_ENDPOINT.to_string()
}

impl Default for LocalSection {
    fn default() -> Self {
        Self {
            endpoint: default_local_endpoint(),
        }
    }
}

impl RunnerSettings {
    pub fn validate(&self) -> Result<()> {
        if self.driver.poll_interval_ms == 0 {
            return Err(WfBenchError::ConfigError(
                "[driver].poll_interval_ms must be >= 1 (got 0)".to_string(),
            ));
        }
        if self.retry.multiplier < 1.0 {
            return Err(WfBenchError::ConfigError(format!(
                "[retry].multiplier must be >= 1.0 (got {})",
                self.retry.multiplier
            )));
        }
        if self.retry.max_delay_ms < self.retry.initial_delay_ms {
            return Err(WfBenchError::ConfigError(
                "[retry].max_delay_ms must be >= [retry].initial_delay_ms".to_string(),
            ));
        }
        if self.local.endpoint.trim().is_empty() {
            return Err(WfBenchError::ConfigError(
                "[local].endpoint must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
