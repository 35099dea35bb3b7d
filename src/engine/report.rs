// src/engine/report.rs

//! What a run leaves behind: invocation records and per-task outcomes.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::dag::{Level, RemovedEdge};
use crate::engine::{TaskName, TaskOutcome};
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::types::{Platform, ScheduleMode};

/// How the worker answered a dispatched request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum InvocationOutcome {
    Success { status: u16 },
    Failure { reason: String },
    /// Dispatched, no answer recorded.
    Unknown,
}

/// One request sent to a worker.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationRecord {
    pub task: TaskName,
    pub endpoint: String,
    pub body: Value,
    pub dispatched_at: DateTime<Utc>,
    pub attempts: u32,
    pub elapsed_ms: u64,
    pub outcome: InvocationOutcome,
}

impl InvocationRecord {
    /// Record a request at dispatch time; the outcome is filled in later.
    pub fn dispatched(task: impl Into<TaskName>, endpoint: impl Into<String>, body: Value) -> Self {
        Self {
            task: task.into(),
            endpoint: endpoint.into(),
            body,
            dispatched_at: Utc::now(),
            attempts: 0,
            elapsed_ms: 0,
            outcome: InvocationOutcome::Unknown,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, InvocationOutcome::Success { .. })
    }
}

/// Summary of one workflow run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub workflow: String,
    pub run_id: String,
    pub platform: Platform,
    pub cores: u32,
    pub schedule: ScheduleMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub levels: Vec<Level>,
    pub removed_edges: Vec<RemovedEdge>,
    pub invocations: Vec<InvocationRecord>,
    pub outcomes: BTreeMap<TaskName, TaskOutcome>,
    /// Whether the finish sentinel saw all of its inputs.
    pub workflow_finished: bool,
}

impl RunReport {
    /// Number of requests actually sent.
    pub fn dispatched_count(&self) -> usize {
        self.invocations.len()
    }

    pub fn outcome_of(&self, task: &str) -> Option<&TaskOutcome> {
        self.outcomes.get(task)
    }

    /// Tasks whose outcome is not a success, sorted.
    pub fn failed_tasks(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| !outcome.is_success())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn succeeded(&self) -> bool {
        self.failed_tasks().is_empty()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, fs: &dyn FileSystem, path: &Path) -> Result<()> {
        let json = self.to_json_pretty()?;
        fs.write(path, json.as_bytes())?;
        info!(path = ?path, "run report written");
        Ok(())
    }

    pub fn log_summary(&self) {
        let elapsed_ms = (self.finished_at - self.started_at).num_milliseconds();
        let failed = self.failed_tasks();

        info!(
            workflow = %self.workflow,
            run_id = %self.run_id,
            tasks = self.outcomes.len(),
            dispatched = self.dispatched_count(),
            failed = failed.len(),
            workflow_finished = self.workflow_finished,
            elapsed_ms,
            "run finished"
        );

        if !failed.is_empty() {
            warn!(?failed, "some tasks did not succeed");
        }
    }
}
