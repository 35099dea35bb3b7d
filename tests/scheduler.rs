// tests/scheduler.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;

use wfbench_runner::dag::{ExecutionPlan, RunState, Scheduler, TaskState, WorkflowGraph, WorkflowRunState};
use wfbench_runner::engine::TaskOutcome;

type TestResult = Result<(), Box<dyn Error>>;

fn plan(adjacency: &[(&str, &[&str])]) -> Result<ExecutionPlan, Box<dyn Error>> {
    let graph = WorkflowGraph::from_adjacency(adjacency.iter().map(|(name, children)| {
        (
            name.to_string(),
            children.iter().map(|c| c.to_string()).collect::<Vec<String>>(),
        )
    }))?;
    Ok(ExecutionPlan::from_graph(graph)?)
}

#[test]
fn sources_are_scheduled_first() -> TestResult {
    init_tracing();

    let plan = plan(&[("A", &["C"]), ("B", &["C"]), ("C", &[])])?;
    let mut scheduler = Scheduler::from_plan(&plan);

    let step = scheduler.start();
    assert_eq!(step.newly_scheduled, vec!["A".to_string(), "B".to_string()]);
    assert_eq!(scheduler.run_state_of("A"), Some(RunState::Running));
    assert_eq!(scheduler.run_state_of("C"), Some(RunState::Pending));

    // C waits for both parents.
    let step = scheduler.step_completion("A", true);
    assert!(step.newly_scheduled.is_empty());
    assert_eq!(scheduler.deps_satisfied("C"), Some(false));

    let step = scheduler.step_completion("B", true);
    assert_eq!(step.newly_scheduled, vec!["C".to_string()]);

    let step = scheduler.step_completion("C", true);
    assert!(step.run_just_finished);
    assert!(scheduler.is_finished());
    Ok(())
}

#[test]
fn failure_marks_all_pending_descendants() -> TestResult {
    init_tracing();

    let plan = plan(&[("A", &["B", "X"]), ("B", &["C"]), ("C", &[]), ("X", &[])])?;
    let mut scheduler = Scheduler::from_plan(&plan);
    scheduler.start();

    let step = scheduler.step_completion("A", false);
    assert_eq!(
        step.newly_failed,
        vec!["B".to_string(), "C".to_string(), "X".to_string()]
    );
    assert!(step.newly_scheduled.is_empty());
    assert!(step.run_just_finished);
    assert_eq!(scheduler.run_state_of("C"), Some(RunState::DoneFailed));
    Ok(())
}

#[test]
fn pre_completed_tasks_unblock_children() -> TestResult {
    init_tracing();

    let plan = plan(&[("A", &["B"]), ("B", &[])])?;
    let mut scheduler = Scheduler::from_plan(&plan);
    scheduler.mark_complete("A");
    scheduler.mark_complete("unknown");

    let step = scheduler.start();
    assert_eq!(step.newly_scheduled, vec!["B".to_string()]);
    assert_eq!(scheduler.task_names(), vec!["A", "B"]);
    Ok(())
}

#[test]
fn completion_of_unknown_task_is_ignored() -> TestResult {
    init_tracing();

    let plan = plan(&[("A", &[])])?;
    let mut scheduler = Scheduler::from_plan(&plan);
    scheduler.start();

    let step = scheduler.step_completion("ghost", true);
    assert!(step.newly_scheduled.is_empty());
    assert!(!step.run_just_finished);
    Ok(())
}

#[test]
fn run_state_claims_each_task_once() {
    init_tracing();

    let state = WorkflowRunState::new();
    assert!(state.claim("A"));
    assert!(!state.claim("A"));
    assert!(state.contains("A"));

    assert!(state.mark_already_complete("B"));
    assert!(!state.mark_already_complete("B"));
    assert_eq!(state.outcome_of("B"), Some(TaskOutcome::AlreadyComplete));
    assert_eq!(state.invoked(), vec!["A".to_string(), "B".to_string()]);
}

#[test]
fn terminal_state_is_never_overwritten() {
    init_tracing();

    let state = WorkflowRunState::new();
    assert_eq!(state.state_of("A"), TaskState::Pending);

    state.set_state("A", TaskState::Polling);
    state.set_state("A", TaskState::Done(TaskOutcome::Completed));
    state.set_state("A", TaskState::Dispatched);
    state.set_state("A", TaskState::Done(TaskOutcome::UpstreamFailed));

    assert_eq!(state.state_of("A"), TaskState::Done(TaskOutcome::Completed));
    assert_eq!(state.outcomes().len(), 1);
    assert!(!state.workflow_finished());
    state.mark_workflow_finished();
    assert!(state.workflow_finished());
}
