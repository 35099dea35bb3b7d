// tests/property/main.rs

use std::collections::{BTreeSet, HashSet};

use proptest::prelude::*;
use wfbench_runner::dag::{ExecutionPlan, RemovedEdge, WorkflowGraph, reattach_orphans};

// Arbitrary directed graphs over `task_0..task_n`, cycles and self-loops
// included: every task gets a random list of child indices.
fn graph_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<(String, Vec<String>)>> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        proptest::collection::vec(
            proptest::collection::vec(0..num_tasks, 0..4),
            num_tasks,
        )
        .prop_map(|raw| {
            raw.into_iter()
                .enumerate()
                .map(|(i, children)| {
                    (
                        format!("task_{i}"),
                        children.into_iter().map(|c| format!("task_{c}")).collect(),
                    )
                })
                .collect()
        })
    })
}

// Acyclic graphs: task `i` may only point at tasks `> i`.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<(String, Vec<String>)>> {
    graph_strategy(max_tasks).prop_map(|adjacency| {
        adjacency
            .into_iter()
            .enumerate()
            .map(|(i, (name, children))| {
                let kept: Vec<String> = children
                    .into_iter()
                    .filter(|c| {
                        c.trim_start_matches("task_")
                            .parse::<usize>()
                            .map(|j| j > i)
                            .unwrap_or(false)
                    })
                    .collect();
                (name, kept)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn residual_graph_is_acyclic(adjacency in graph_strategy(12)) {
        let graph = WorkflowGraph::from_adjacency(adjacency).expect("indices are in range");
        let edges_before = graph.edge_count();
        let plan = ExecutionPlan::from_graph(graph).expect("plan");

        prop_assert!(plan.graph.is_acyclic());
        prop_assert_eq!(plan.graph.edge_count() + plan.removed_edges.len(), edges_before);
    }

    #[test]
    fn every_task_appears_in_exactly_one_level(adjacency in graph_strategy(12)) {
        let expected: BTreeSet<String> = adjacency.iter().map(|(name, _)| name.clone()).collect();
        let graph = WorkflowGraph::from_adjacency(adjacency).expect("indices are in range");
        let plan = ExecutionPlan::from_graph(graph).expect("plan");

        let mut seen = HashSet::new();
        for level in plan.levels.iter() {
            prop_assert!(!level.is_empty());
            let mut sorted = level.clone();
            sorted.sort();
            prop_assert_eq!(&sorted, level);
            for name in level {
                prop_assert!(seen.insert(name.clone()), "{} scheduled twice", name);
            }
        }
        let seen: BTreeSet<String> = seen.into_iter().collect();
        prop_assert_eq!(seen, expected);
    }

    #[test]
    fn residual_edges_descend_levels(adjacency in graph_strategy(12)) {
        let graph = WorkflowGraph::from_adjacency(adjacency).expect("indices are in range");
        let plan = ExecutionPlan::from_graph(graph).expect("plan");

        for (from, to) in plan.graph.edges() {
            let (Some(a), Some(b)) = (plan.level_index_of(from), plan.level_index_of(to)) else {
                return Err(TestCaseError::fail(format!("{from} or {to} has no level")));
            };
            prop_assert!(a < b, "{} (level {}) -> {} (level {})", from, a, to, b);
        }
    }

    #[test]
    fn acyclic_input_loses_no_edges(adjacency in dag_strategy(12)) {
        let graph = WorkflowGraph::from_adjacency(adjacency).expect("indices are in range");
        let plan = ExecutionPlan::from_graph(graph).expect("plan");

        prop_assert!(plan.removed_edges.is_empty());
        for name in plan.graph.sources() {
            prop_assert_eq!(plan.level_index_of(name), Some(0));
        }
    }

    #[test]
    fn orphans_are_appended_at_most_once(
        present in proptest::collection::btree_set("[a-e]", 0..5),
        targets in proptest::collection::vec("[a-h]", 0..8),
    ) {
        let mut levels: Vec<Vec<String>> = present.iter().map(|name| vec![name.clone()]).collect();
        let before = levels.len();
        let removed: Vec<RemovedEdge> = targets
            .iter()
            .map(|to| RemovedEdge { from: "root".to_string(), to: to.clone() })
            .collect();

        let appended = reattach_orphans(&mut levels, &removed);

        let expected: BTreeSet<String> = targets
            .iter()
            .filter(|t| !present.contains(*t))
            .cloned()
            .collect();
        prop_assert_eq!(appended.len(), expected.len());
        prop_assert_eq!(levels.len(), before + expected.len());
        for (offset, name) in appended.iter().enumerate() {
            prop_assert_eq!(&levels[before + offset], &vec![name.clone()]);
        }

        // A second pass changes nothing.
        let again = reattach_orphans(&mut levels, &removed);
        prop_assert!(again.is_empty());
    }
}
