// src/engine/driver.rs

//! Execution driver: walks the plan and fans out per-task units.
//!
//! In `levels` mode every task of a level is driven concurrently and the
//! driver joins all of them before moving to the next level. In
//! `dependencies` mode a [`Scheduler`] releases a task as soon as all of its
//! residual-graph parents succeeded.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info, warn};

use crate::config::model::WorkflowDescription;
use crate::dag::{ExecutionPlan, Scheduler, TaskState, WorkflowRunState};
use crate::engine::report::{InvocationRecord, RunReport};
use crate::engine::{RunOptions, TaskName, TaskOutcome};
use crate::errors::Result;
use crate::exec::backend::Invoker;
use crate::exec::invocation::InvocationTarget;
use crate::exec::task_runner::{self, TaskRun, UnitContext};
use crate::fs::FileSystem;
use crate::types::ScheduleMode;
use crate::watch::ReadinessProbe;

/// Start/finish marker tasks, recognised by the last `-` segment of the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentinelKind {
    Start,
    Finish,
}

/// `blast-start` is a start sentinel, `blast-finish` a finish sentinel; a
/// bare `start` without a `-` is an ordinary task.
pub fn sentinel_kind(name: &str) -> Option<SentinelKind> {
    match name.rsplit_once('-').map(|(_, last)| last) {
        Some("start") => Some(SentinelKind::Start),
        Some("finish") => Some(SentinelKind::Finish),
        _ => None,
    }
}

pub struct ExecutionDriver<I: Invoker> {
    workflow: WorkflowDescription,
    plan: ExecutionPlan,
    target: Box<dyn InvocationTarget>,
    invoker: I,
    probe: ReadinessProbe,
    options: RunOptions,
    run_id: String,
    cores: u32,
    workdir: PathBuf,
    run_state: WorkflowRunState,
}

impl<I: Invoker> ExecutionDriver<I> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        workflow: WorkflowDescription,
        plan: ExecutionPlan,
        target: Box<dyn InvocationTarget>,
        invoker: I,
        fs: Arc<dyn FileSystem>,
        run_id: impl Into<String>,
        cores: u32,
        options: RunOptions,
    ) -> Self {
        let run_id = run_id.into();
        let probe = ReadinessProbe::new(fs, workflow.result_dir(&run_id));
        let workdir = workflow.workdir(&run_id);

        Self {
            workflow,
            plan,
            target,
            invoker,
            probe,
            options,
            run_id,
            cores,
            workdir,
            run_state: WorkflowRunState::new(),
        }
    }

    pub fn plan(&self) -> &ExecutionPlan {
        &self.plan
    }

    pub fn run_state(&self) -> &WorkflowRunState {
        &self.run_state
    }

    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    /// Record every non-sentinel task whose declared outputs already exist
    /// as `AlreadyComplete`. A task declaring no outputs has nothing left to
    /// produce and is recorded too. Returns those tasks, sorted.
    pub fn pre_verify(&self) -> Result<Vec<TaskName>> {
        let present = self.probe.list_names()?;
        let mut complete = Vec::new();

        for name in self.plan.graph.tasks() {
            if sentinel_kind(name).is_some() {
                continue;
            }
            let Some(task) = self.workflow.task(name) else {
                continue;
            };
            let outputs = task.output_files();
            if !outputs.iter().all(|(file, _)| present.contains(file)) {
                continue;
            }
            if self.run_state.mark_already_complete(name) {
                debug!(task = %name, "outputs present; task already complete");
                complete.push(name.to_string());
            }
        }

        complete.sort();
        if !complete.is_empty() {
            info!(count = complete.len(), "tasks verified complete before the run");
        }
        Ok(complete)
    }

    /// Pre-verify, then walk the plan in the configured schedule mode.
    pub async fn run(&self) -> Result<RunReport> {
        let started_at = Utc::now();
        info!(
            workflow = %self.workflow.name,
            run_id = %self.run_id,
            platform = %self.target.platform(),
            cores = self.cores,
            schedule = ?self.options.schedule,
            result_dir = ?self.probe.dir(),
            "starting workflow run"
        );

        self.pre_verify()?;

        let invocations = match self.options.schedule {
            ScheduleMode::Levels => self.run_levels().await,
            ScheduleMode::Dependencies => self.run_dependencies().await,
        };

        let report = RunReport {
            workflow: self.workflow.name.clone(),
            run_id: self.run_id.clone(),
            platform: self.target.platform(),
            cores: self.cores,
            schedule: self.options.schedule,
            started_at,
            finished_at: Utc::now(),
            levels: self.plan.levels.clone(),
            removed_edges: self.plan.removed_edges.clone(),
            invocations,
            outcomes: self.run_state.outcomes(),
            workflow_finished: self.run_state.workflow_finished(),
        };
        report.log_summary();
        Ok(report)
    }

    async fn run_levels(&self) -> Vec<InvocationRecord> {
        let mut records = Vec::new();
        let total = self.plan.levels.len();

        for (index, level) in self.plan.levels.iter().enumerate() {
            info!(level = index, of = total, tasks = level.len(), "starting level");

            let units = level.iter().map(|name| self.drive_task(name.clone()));
            let runs = join_all(units).await;

            let failed = runs.iter().filter(|run| !run.outcome.is_success()).count();
            records.extend(runs.into_iter().filter_map(|run| run.record));

            info!(level = index, failed, "level complete");
        }

        records
    }

    async fn run_dependencies(&self) -> Vec<InvocationRecord> {
        let mut scheduler = Scheduler::from_plan(&self.plan);
        for name in self.run_state.invoked() {
            scheduler.mark_complete(&name);
        }

        let mut records = Vec::new();
        let mut in_flight = FuturesUnordered::new();

        let step = scheduler.start();
        for name in step.newly_scheduled {
            in_flight.push(self.drive_task(name));
        }

        while let Some(run) = in_flight.next().await {
            let step = scheduler.step_completion(&run.task, run.outcome.is_success());

            for failed in step.newly_failed.iter() {
                debug!(task = %failed, upstream = %run.task, "dependent will not run");
                self.run_state
                    .set_state(failed, TaskState::Done(TaskOutcome::UpstreamFailed));
            }
            for next in step.newly_scheduled {
                in_flight.push(self.drive_task(next));
            }
            records.extend(run.record);

            if step.run_just_finished {
                debug!("dependency walk complete");
            }
        }

        records
    }

    /// Drive one task to a terminal outcome.
    async fn drive_task(&self, name: TaskName) -> TaskRun {
        if let Some(outcome) = self.run_state.outcome_of(&name) {
            debug!(task = %name, ?outcome, "task already terminal; skipping");
            return TaskRun::without_dispatch(name, outcome);
        }

        if let Some(parent) = self.failed_parent(&name) {
            warn!(task = %name, parent = %parent, "parent failed; not running task");
            return task_runner::finish(&self.run_state, &name, TaskOutcome::UpstreamFailed, None);
        }

        let Some(task) = self.workflow.task(&name) else {
            warn!(task = %name, "task missing from workflow description");
            return task_runner::finish(&self.run_state, &name, TaskOutcome::NoOp, None);
        };

        match sentinel_kind(&name) {
            Some(SentinelKind::Start) => {
                debug!(task = %name, "start sentinel");
                task_runner::finish(&self.run_state, &name, TaskOutcome::NoOp, None)
            }
            Some(SentinelKind::Finish) => self.drive_finish_sentinel(&name, &task.input_files()).await,
            None if !task.has_invocation() => {
                debug!(task = %name, "no command arguments; nothing to dispatch");
                task_runner::finish(&self.run_state, &name, TaskOutcome::NoOp, None)
            }
            None => {
                let ctx = UnitContext {
                    target: self.target.as_ref(),
                    invoker: &self.invoker,
                    probe: &self.probe,
                    run_state: &self.run_state,
                    options: &self.options,
                    workdir: &self.workdir,
                };
                task_runner::run_task(&name, task, &ctx).await
            }
        }
    }

    async fn drive_finish_sentinel(&self, name: &str, inputs: &[String]) -> TaskRun {
        self.run_state.set_state(name, TaskState::Polling);
        match self
            .probe
            .wait_until_ready(
                name,
                inputs,
                self.options.poll_interval,
                self.options.readiness_timeout,
            )
            .await
        {
            Ok(_) => {
                info!(task = %name, "finish sentinel satisfied; workflow complete");
                self.run_state.mark_workflow_finished();
                task_runner::finish(&self.run_state, name, TaskOutcome::NoOp, None)
            }
            Err(err) => {
                warn!(task = %name, error = %err, "finish sentinel never satisfied");
                task_runner::finish(&self.run_state, name, TaskOutcome::ReadinessTimeout, None)
            }
        }
    }

    /// First residual-graph parent that ended in a failure outcome.
    fn failed_parent(&self, name: &str) -> Option<TaskName> {
        self.plan
            .graph
            .parents_of(name)
            .into_iter()
            .find(|parent| {
                self.run_state
                    .outcome_of(parent)
                    .is_some_and(|outcome| !outcome.is_success())
            })
            .map(String::from)
    }
}
