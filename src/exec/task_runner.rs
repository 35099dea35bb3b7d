// src/exec/task_runner.rs

//! Single-task execution logic.
//!
//! One call to [`run_task`] drives a dispatchable task through
//! `Polling -> Dispatched -> Done`: wait for its inputs, build the request,
//! claim it in the run state, and call the worker under the retry policy.
//! Sentinels, upstream failures and tasks without arguments are handled by
//! the driver before it gets here.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::model::TaskSpec;
use crate::dag::{TaskState, WorkflowRunState};
use crate::engine::report::{InvocationOutcome, InvocationRecord};
use crate::engine::{RunOptions, TaskName, TaskOutcome};
use crate::watch::ReadinessProbe;

use super::backend::Invoker;
use super::invocation::InvocationTarget;

/// Everything a per-task unit borrows from the driver.
pub struct UnitContext<'a, I: ?Sized> {
    pub target: &'a dyn InvocationTarget,
    pub invoker: &'a I,
    pub probe: &'a ReadinessProbe,
    pub run_state: &'a WorkflowRunState,
    pub options: &'a RunOptions,
    pub workdir: &'a Path,
}

/// Result of one per-task unit.
#[derive(Debug, Clone)]
pub struct TaskRun {
    pub task: TaskName,
    pub outcome: TaskOutcome,
    /// Present iff a request was sent.
    pub record: Option<InvocationRecord>,
}

impl TaskRun {
    pub fn without_dispatch(task: impl Into<TaskName>, outcome: TaskOutcome) -> Self {
        Self {
            task: task.into(),
            outcome,
            record: None,
        }
    }
}

/// Record `outcome` as terminal for `task` and wrap it.
pub fn finish(
    run_state: &WorkflowRunState,
    task: &str,
    outcome: TaskOutcome,
    record: Option<InvocationRecord>,
) -> TaskRun {
    run_state.set_state(task, TaskState::Done(outcome.clone()));
    TaskRun {
        task: task.to_string(),
        outcome,
        record,
    }
}

pub async fn run_task<I>(name: &str, task: &TaskSpec, ctx: &UnitContext<'_, I>) -> TaskRun
where
    I: Invoker + ?Sized,
{
    if ctx.run_state.contains(name) {
        debug!(task = %name, "already invoked in this run; skipping");
        let outcome = ctx
            .run_state
            .outcome_of(name)
            .unwrap_or(TaskOutcome::AlreadyComplete);
        return TaskRun::without_dispatch(name, outcome);
    }

    ctx.run_state.set_state(name, TaskState::Polling);
    let inputs = task.input_files();
    if let Err(err) = ctx
        .probe
        .wait_until_ready(
            name,
            &inputs,
            ctx.options.poll_interval,
            ctx.options.readiness_timeout,
        )
        .await
    {
        warn!(task = %name, error = %err, "giving up on task inputs");
        return finish(ctx.run_state, name, TaskOutcome::ReadinessTimeout, None);
    }

    let request = match ctx.target.build_request(name, task, ctx.workdir) {
        Ok(request) => request,
        Err(err) => {
            warn!(task = %name, error = %err, "cannot build invocation");
            return finish(
                ctx.run_state,
                name,
                TaskOutcome::ArgumentEncodingFailed(err.to_string()),
                None,
            );
        }
    };

    if !ctx.run_state.claim(name) {
        let outcome = ctx
            .run_state
            .outcome_of(name)
            .unwrap_or(TaskOutcome::AlreadyComplete);
        return TaskRun::without_dispatch(name, outcome);
    }

    ctx.run_state.set_state(name, TaskState::Dispatched);
    info!(task = %name, url = %request.url, "dispatching task");

    let mut record = InvocationRecord::dispatched(name, request.url.clone(), request.body.clone());
    let started = Instant::now();
    let (result, attempts) = ctx
        .options
        .retry
        .execute(name, |_attempt| ctx.invoker.invoke(&request))
        .await;
    record.attempts = attempts;
    record.elapsed_ms = started.elapsed().as_millis() as u64;

    let outcome = match result {
        Ok(response) => {
            debug!(task = %name, status = response.status, attempts, "worker accepted task");
            record.outcome = InvocationOutcome::Success {
                status: response.status,
            };
            TaskOutcome::Completed
        }
        Err(err) => {
            warn!(task = %name, attempts, error = %err, "invocation failed");
            record.outcome = InvocationOutcome::Failure {
                reason: err.to_string(),
            };
            TaskOutcome::InvocationFailed(err.to_string())
        }
    };

    finish(ctx.run_state, name, outcome, Some(record))
}
