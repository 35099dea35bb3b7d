// src/engine/mod.rs

//! Execution engine.
//!
//! This module ties together:
//! - the execution plan (levels, residual graph)
//! - the readiness probe over the run's result directory
//! - the invocation target + invoker backend
//! - the per-run state shared with concurrent per-task units
//!
//! The level/dependency walk lives in [`driver`]; the outcome records that a
//! run produces are in [`report`].

use std::time::Duration;

use serde::Serialize;

use crate::config::settings::RunnerSettings;
use crate::exec::retry::RetryPolicy;
use crate::types::ScheduleMode;

/// Canonical task name type used throughout the crate.
pub type TaskName = String;

/// Terminal outcome of one task in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum TaskOutcome {
    /// The worker accepted the invocation.
    Completed,
    /// Outputs were already present before the run reached the task.
    AlreadyComplete,
    /// Nothing to dispatch (sentinel or task without command arguments).
    NoOp,
    /// Inputs never appeared before the readiness deadline.
    ReadinessTimeout,
    /// Arguments could not be encoded into a request.
    ArgumentEncodingFailed(String),
    /// Every attempt to call the worker failed.
    InvocationFailed(String),
    /// A parent task failed, so this one was never attempted.
    UpstreamFailed,
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            TaskOutcome::Completed | TaskOutcome::AlreadyComplete | TaskOutcome::NoOp
        )
    }
}

/// Knobs of a single run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub poll_interval: Duration,
    pub readiness_timeout: Duration,
    pub retry: RetryPolicy,
    pub schedule: ScheduleMode,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            readiness_timeout: Duration::from_secs(600),
            retry: RetryPolicy::default(),
            schedule: ScheduleMode::Levels,
        }
    }
}

impl From<&RunnerSettings> for RunOptions {
    fn from(settings: &RunnerSettings) -> Self {
        Self {
            poll_interval: Duration::from_millis(settings.driver.poll_interval_ms),
            readiness_timeout: Duration::from_secs(settings.driver.readiness_timeout_secs),
            retry: settings.retry.to_policy(),
            schedule: settings.driver.schedule,
        }
    }
}

pub mod driver;
pub mod report;

pub use driver::ExecutionDriver;
pub use report::{InvocationOutcome, InvocationRecord, RunReport};
