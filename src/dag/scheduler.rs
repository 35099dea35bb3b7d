// src/dag/scheduler.rs

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::dag::ExecutionPlan;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::task_info::{RunState, TaskInfo};
use crate::engine::TaskName;

/// Dependency-driven scheduler used by the `dependencies` schedule mode.
///
/// It is responsible for:
/// - remembering the direct dependencies of every task (residual graph)
/// - deciding when a task is eligible (all dependencies succeeded)
/// - marking tasks as succeeded/failed
/// - failing dependents when a task fails
///
/// It performs no IO; the driver feeds it completions and dispatches what it
/// returns.
#[derive(Debug)]
pub struct Scheduler {
    tasks: HashMap<TaskName, TaskInfo>,
    dependents: HashMap<TaskName, Vec<TaskName>>,
}

impl Scheduler {
    /// Construct a scheduler over the residual graph of `plan`.
    pub fn from_plan(plan: &ExecutionPlan) -> Self {
        let mut tasks = HashMap::new();
        let mut dependents: HashMap<TaskName, Vec<TaskName>> = HashMap::new();

        for name in plan.graph.tasks() {
            let deps: Vec<TaskName> = plan
                .graph
                .parents_of(name)
                .into_iter()
                .map(String::from)
                .collect();
            let children: Vec<TaskName> = plan
                .graph
                .children_of(name)
                .into_iter()
                .map(String::from)
                .collect();
            tasks.insert(name.to_string(), TaskInfo::new(name.to_string(), deps));
            dependents.insert(name.to_string(), children);
        }

        Self { tasks, dependents }
    }

    /// Record a task as already complete before the run starts.
    pub fn mark_complete(&mut self, task: &str) {
        match self.tasks.get_mut(task) {
            Some(info) => {
                debug!(task = %task, "task verified complete before run");
                info.run_state = RunState::DoneSuccess;
            }
            None => warn!(task = %task, "completion mark for unknown task; ignoring"),
        }
    }

    /// Read-only view of the given task's run state.
    pub fn run_state_of(&self, task: &str) -> Option<RunState> {
        self.tasks.get(task).map(|info| info.run_state)
    }

    /// Whether every dependency of `task` has succeeded.
    ///
    /// Returns `None` if the task is unknown.
    pub fn deps_satisfied(&self, task: &str) -> Option<bool> {
        let info = self.tasks.get(task)?;
        Some(self.deps_satisfied_for_info(info))
    }

    /// `true` once every task is in a terminal state.
    pub fn is_finished(&self) -> bool {
        self.tasks.values().all(|info| info.run_state.is_terminal())
    }

    /// Task names, sorted.
    pub fn task_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tasks.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    /// Schedule every task whose dependencies are already satisfied.
    pub fn start(&mut self) -> SchedulerStep {
        let newly_scheduled = self.collect_new_ready_tasks();
        SchedulerStep {
            newly_scheduled,
            newly_failed: Vec::new(),
            run_just_finished: self.is_finished(),
        }
    }

    /// Record the terminal outcome of an in-flight task and return what
    /// changed as a result.
    pub fn step_completion(&mut self, task: &str, success: bool) -> SchedulerStep {
        let mut newly_scheduled = Vec::new();
        let mut newly_failed = Vec::new();

        match self.tasks.get_mut(task) {
            Some(info) => {
                if success {
                    info.run_state = RunState::DoneSuccess;
                    debug!(task = %info.name, "task completed successfully");
                    newly_scheduled = self.collect_new_ready_tasks();
                } else {
                    info.run_state = RunState::DoneFailed;
                    warn!(task = %info.name, "task failed; failing dependents in this run");
                    newly_failed = self.mark_dependents_failed(task);
                }
            }
            None => {
                warn!(task = %task, "completion for unknown task; ignoring");
            }
        }

        let run_just_finished = self.is_finished();
        if run_just_finished {
            info!("scheduler: all tasks terminal");
        }

        SchedulerStep {
            newly_scheduled,
            newly_failed,
            run_just_finished,
        }
    }

    fn deps_satisfied_for_info(&self, info: &TaskInfo) -> bool {
        info.deps.iter().all(|dep| {
            matches!(
                self.tasks.get(dep).map(|d| d.run_state),
                Some(RunState::DoneSuccess)
            )
        })
    }

    /// Collect tasks that are `Pending` and whose dependencies are satisfied,
    /// mark them as `Running`, and return their names (sorted).
    fn collect_new_ready_tasks(&mut self) -> Vec<TaskName> {
        // Decide first, then mutate, to avoid borrowing conflicts.
        let mut candidates: Vec<TaskName> = self
            .tasks
            .values()
            .filter(|info| {
                info.run_state == RunState::Pending && self.deps_satisfied_for_info(info)
            })
            .map(|info| info.name.clone())
            .collect();
        candidates.sort();

        for name in candidates.iter() {
            if let Some(info) = self.tasks.get_mut(name) {
                debug!(task = %info.name, "dependencies satisfied; marking Running");
                info.run_state = RunState::Running;
            }
        }

        candidates
    }

    /// Mark every pending dependent (transitively) of a failed task as
    /// `DoneFailed`. Returns the newly failed tasks, excluding the root.
    fn mark_dependents_failed(&mut self, failed_task: &str) -> Vec<TaskName> {
        let mut stack: Vec<TaskName> = self
            .dependents
            .get(failed_task)
            .cloned()
            .unwrap_or_default();

        let mut newly_failed = Vec::new();

        while let Some(name) = stack.pop() {
            if let Some(info) = self.tasks.get_mut(&name) {
                if info.run_state == RunState::Pending {
                    info.run_state = RunState::DoneFailed;
                    debug!(
                        task = %info.name,
                        "marking dependent as DoneFailed due to upstream failure"
                    );
                    newly_failed.push(info.name.clone());
                    if let Some(children) = self.dependents.get(&name) {
                        stack.extend(children.iter().cloned());
                    }
                }
            }
        }

        newly_failed.sort();
        newly_failed
    }
}
