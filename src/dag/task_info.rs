// src/dag/task_info.rs

//! Per-task state used by the driver and the dependency scheduler.

use crate::engine::{TaskName, TaskOutcome};

/// Position of a task in the driver's state machine.
///
/// `Pending -> Polling -> Dispatched -> Done(outcome)`. Tasks that never get
/// dispatched (already complete, sentinels, upstream failures, readiness
/// timeouts) jump straight to `Done`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    /// Level not reached yet (or not yet eligible).
    Pending,
    /// Waiting for declared inputs to appear in the result directory.
    Polling,
    /// Request sent; waiting for the worker to answer.
    Dispatched,
    /// Terminal.
    Done(TaskOutcome),
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Done(_))
    }

    pub fn outcome(&self) -> Option<&TaskOutcome> {
        match self {
            TaskState::Done(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// Per-run state of a task inside the dependency scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Waiting on dependencies.
    Pending,
    /// Handed to the driver and currently in flight.
    Running,
    /// Finished with a successful outcome (or verified complete up front).
    DoneSuccess,
    /// Failed, or blocked by a failed dependency.
    DoneFailed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::DoneSuccess | RunState::DoneFailed)
    }
}

/// Static dependency information for a task, plus its scheduler state.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub name: TaskName,
    /// Direct dependencies in the residual (acyclic) graph.
    pub deps: Vec<TaskName>,
    pub run_state: RunState,
}

impl TaskInfo {
    pub fn new(name: TaskName, deps: Vec<TaskName>) -> Self {
        Self {
            name,
            deps,
            run_state: RunState::Pending,
        }
    }
}
