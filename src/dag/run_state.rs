// src/dag/run_state.rs

//! The set of tasks known to be invoked or complete in one workflow run.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::dag::task_info::TaskState;
use crate::engine::{TaskName, TaskOutcome};

#[derive(Debug, Default)]
struct Inner {
    /// Tasks confirmed invoked or complete. Only ever grows.
    invoked: BTreeSet<TaskName>,
    states: BTreeMap<TaskName, TaskState>,
    workflow_finished: bool,
}

/// Run-scoped record of what has been invoked.
///
/// Owned by the driver and lent by reference to the concurrent per-task
/// units. Every mutation happens under one mutex, so claiming a task for
/// dispatch is atomic: two units can never both dispatch the same task.
#[derive(Debug, Default)]
pub struct WorkflowRunState {
    inner: Mutex<Inner>,
}

impl WorkflowRunState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether `task` was already invoked or verified complete.
    pub fn contains(&self, task: &str) -> bool {
        self.lock().invoked.contains(task)
    }

    /// Record `task` as invoked. Returns `false` if it already was, in which
    /// case the caller must not dispatch it.
    pub fn claim(&self, task: &str) -> bool {
        let inserted = self.lock().invoked.insert(task.to_string());
        if !inserted {
            debug!(task = %task, "task already claimed in this run");
        }
        inserted
    }

    /// Record `task` as complete before the walk (its outputs already exist).
    pub fn mark_already_complete(&self, task: &str) -> bool {
        let mut inner = self.lock();
        if !inner.invoked.insert(task.to_string()) {
            return false;
        }
        inner
            .states
            .insert(task.to_string(), TaskState::Done(TaskOutcome::AlreadyComplete));
        true
    }

    /// Move `task` to `state`. A terminal state is never overwritten.
    pub fn set_state(&self, task: &str, state: TaskState) {
        let mut inner = self.lock();
        match inner.states.get(task) {
            Some(existing) if existing.is_terminal() => {
                debug!(task = %task, ?existing, ?state, "ignoring transition out of terminal state");
            }
            _ => {
                inner.states.insert(task.to_string(), state);
            }
        }
    }

    pub fn state_of(&self, task: &str) -> TaskState {
        self.lock()
            .states
            .get(task)
            .cloned()
            .unwrap_or(TaskState::Pending)
    }

    pub fn outcome_of(&self, task: &str) -> Option<TaskOutcome> {
        self.lock()
            .states
            .get(task)
            .and_then(|s| s.outcome().cloned())
    }

    /// Names of all invoked/complete tasks, sorted.
    pub fn invoked(&self) -> Vec<TaskName> {
        self.lock().invoked.iter().cloned().collect()
    }

    /// Terminal outcome of every task that reached one.
    pub fn outcomes(&self) -> BTreeMap<TaskName, TaskOutcome> {
        self.lock()
            .states
            .iter()
            .filter_map(|(name, state)| state.outcome().map(|o| (name.clone(), o.clone())))
            .collect()
    }

    pub fn mark_workflow_finished(&self) {
        self.lock().workflow_finished = true;
    }

    pub fn workflow_finished(&self) -> bool {
        self.lock().workflow_finished
    }
}
