// src/dag/scheduler_step.rs

//! Step-by-step result type for the dependency scheduler.

use crate::engine::TaskName;

/// Structured result of a single scheduler "step".
#[derive(Debug, Clone, Default)]
pub struct SchedulerStep {
    /// Tasks that became eligible as a result of this step.
    pub newly_scheduled: Vec<TaskName>,
    /// Dependents newly marked as failed because of an upstream failure.
    pub newly_failed: Vec<TaskName>,
    /// Whether every task is now terminal.
    pub run_just_finished: bool,
}
