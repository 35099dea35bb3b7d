// tests/dag_levels.rs

mod common;
use crate::common::builders::diamond;
use crate::common::init_tracing;

use std::error::Error;

use wfbench_runner::dag::{
    ExecutionPlan, RemovedEdge, WorkflowGraph, assign_levels, break_cycles, group_by_level,
    reattach_orphans,
};
use wfbench_runner::errors::WfBenchError;

type TestResult = Result<(), Box<dyn Error>>;

fn graph(adjacency: &[(&str, &[&str])]) -> Result<WorkflowGraph, WfBenchError> {
    WorkflowGraph::from_adjacency(adjacency.iter().map(|(name, children)| {
        (
            name.to_string(),
            children.iter().map(|c| c.to_string()).collect::<Vec<String>>(),
        )
    }))
}

fn names(levels: &[Vec<String>]) -> Vec<Vec<&str>> {
    levels
        .iter()
        .map(|level| level.iter().map(String::as_str).collect())
        .collect()
}

#[test]
fn diamond_has_three_levels() -> TestResult {
    init_tracing();

    let g = graph(&[("A", &["B", "C"]), ("B", &["D"]), ("C", &["D"]), ("D", &[])])?;
    let plan = ExecutionPlan::from_graph(g)?;

    assert!(plan.removed_edges.is_empty());
    assert_eq!(names(&plan.levels), vec![vec!["A"], vec!["B", "C"], vec!["D"]]);
    Ok(())
}

#[test]
fn level_is_longest_path_from_a_source() -> TestResult {
    init_tracing();

    // A -> B -> C and a shortcut A -> C: C sits below B, not beside it.
    let g = graph(&[("A", &["B", "C"]), ("B", &["C"]), ("C", &[])])?;
    let levels = assign_levels(&g)?;

    assert_eq!(levels["A"], 0);
    assert_eq!(levels["B"], 1);
    assert_eq!(levels["C"], 2);
    Ok(())
}

#[test]
fn disconnected_tasks_share_level_zero() -> TestResult {
    init_tracing();

    let g = graph(&[("b", &[]), ("a", &[]), ("c", &["d"]), ("d", &[])])?;
    let levels = group_by_level(&assign_levels(&g)?);

    assert_eq!(names(&levels), vec![vec!["a", "b", "c"], vec!["d"]]);
    Ok(())
}

#[test]
fn every_edge_goes_down_a_level() -> TestResult {
    init_tracing();

    let g = graph(&[
        ("s", &["a", "b"]),
        ("a", &["c"]),
        ("b", &["c", "d"]),
        ("c", &["e"]),
        ("d", &["e"]),
        ("e", &[]),
    ])?;
    let levels = assign_levels(&g)?;

    for (from, to) in g.edges() {
        assert!(levels[from] < levels[to], "{from} -> {to} does not descend");
    }
    Ok(())
}

#[test]
fn duplicate_children_collapse_into_one_edge() -> TestResult {
    init_tracing();

    let g = graph(&[("A", &["B", "B"]), ("B", &[])])?;
    assert_eq!(g.edge_count(), 1);
    assert!(g.has_edge("A", "B"));
    Ok(())
}

#[test]
fn dangling_child_is_malformed() {
    init_tracing();

    let err = graph(&[("A", &["X"])]).expect_err("unknown child must be rejected");
    match err {
        WfBenchError::MalformedWorkflow(msg) => assert!(msg.contains("'X'"), "got: {msg}"),
        other => panic!("expected MalformedWorkflow, got {other:?}"),
    }
}

#[test]
fn pure_cycle_loses_exactly_one_edge() -> TestResult {
    init_tracing();

    let g = graph(&[("u", &["v"]), ("v", &["w"]), ("w", &["u"])])?;
    let plan = ExecutionPlan::from_graph(g)?;

    assert_eq!(plan.removed_edges.len(), 1);
    assert!(plan.graph.is_acyclic());
    assert_eq!(plan.graph.edge_count(), 2);

    // The destination of the removed edge becomes the only source.
    let removed = &plan.removed_edges[0];
    assert_eq!(plan.levels.len(), 3);
    assert_eq!(plan.levels[0], vec![removed.to.clone()]);
    assert_eq!(plan.task_count(), 3);
    Ok(())
}

#[test]
fn self_loop_is_removed_as_single_edge() -> TestResult {
    init_tracing();

    let mut g = graph(&[("A", &["A", "B"]), ("B", &[])])?;
    let removed = break_cycles(&mut g);

    assert_eq!(
        removed,
        vec![RemovedEdge {
            from: "A".to_string(),
            to: "A".to_string()
        }]
    );
    let plan = ExecutionPlan::from_graph(g)?;
    assert_eq!(names(&plan.levels), vec![vec!["A"], vec!["B"]]);
    Ok(())
}

#[test]
fn two_independent_cycles_lose_one_edge_each() -> TestResult {
    init_tracing();

    let mut g = graph(&[
        ("a", &["b"]),
        ("b", &["a"]),
        ("x", &["y"]),
        ("y", &["z"]),
        ("z", &["x"]),
    ])?;
    let removed = break_cycles(&mut g);

    assert_eq!(removed.len(), 2);
    assert!(g.is_acyclic());
    Ok(())
}

#[test]
fn find_cycle_reports_edges_in_path_order() -> TestResult {
    init_tracing();

    let g = graph(&[("A", &["B"]), ("B", &["C"]), ("C", &["A"])])?;
    let cycle = g.find_cycle(Some("A")).ok_or("expected a cycle")?;

    let as_str: Vec<(&str, &str)> = cycle.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
    assert_eq!(as_str, vec![("A", "B"), ("B", "C"), ("C", "A")]);
    assert!(graph(&[("A", &["B"]), ("B", &[])])?.find_cycle(None).is_none());
    Ok(())
}

#[test]
fn orphan_is_appended_once_as_trailing_level() {
    init_tracing();

    let mut levels = vec![vec!["A".to_string()], vec!["B".to_string()]];
    let removed = vec![
        RemovedEdge {
            from: "A".to_string(),
            to: "Z".to_string(),
        },
        RemovedEdge {
            from: "B".to_string(),
            to: "Z".to_string(),
        },
        RemovedEdge {
            from: "B".to_string(),
            to: "A".to_string(),
        },
    ];

    let appended = reattach_orphans(&mut levels, &removed);

    assert_eq!(appended, vec!["Z".to_string()]);
    assert_eq!(names(&levels), vec![vec!["A"], vec!["B"], vec!["Z"]]);
}

#[test]
fn plan_from_workflow_description() -> TestResult {
    init_tracing();

    let workflow = diamond("/data").build();
    let plan = ExecutionPlan::build(&workflow)?;

    assert_eq!(plan.level_index_of("A"), Some(0));
    assert_eq!(plan.level_index_of("C"), Some(1));
    assert_eq!(plan.level_index_of("D"), Some(2));
    assert_eq!(plan.level_index_of("nope"), None);
    assert_eq!(plan.level_of.len(), 4);
    Ok(())
}
