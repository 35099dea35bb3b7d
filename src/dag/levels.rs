// src/dag/levels.rs

//! Level assignment and grouping.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::debug;

use crate::dag::cycles::RemovedEdge;
use crate::dag::graph::WorkflowGraph;
use crate::engine::TaskName;
use crate::errors::{Result, WfBenchError};

/// Tasks that share a level, sorted lexicographically.
pub type Level = Vec<TaskName>;

/// Longest-path distance from any source, for every task.
///
/// Every source starts at 0; a breadth-first relaxation seeded with all
/// sources sets `level(child) = max(level(child), level(parent) + 1)` and
/// re-enqueues a child whenever its level grows, until no update is pending.
/// Consequently every edge `u -> v` ends with `level(u) < level(v)`.
///
/// The graph must be acyclic. A level beyond the task count can only come
/// from a cycle and is reported as [`WfBenchError::MalformedWorkflow`].
pub fn assign_levels(graph: &WorkflowGraph) -> Result<BTreeMap<TaskName, usize>> {
    let mut levels: BTreeMap<TaskName, usize> =
        graph.tasks().map(|name| (name.to_string(), 0)).collect();

    let mut queue: VecDeque<TaskName> = graph.sources().into_iter().map(String::from).collect();
    let limit = graph.node_count();

    while let Some(node) = queue.pop_front() {
        let current = levels.get(&node).copied().unwrap_or(0);

        for child in graph.children_of(&node) {
            let candidate = current + 1;
            let entry = levels.entry(child.to_string()).or_insert(0);
            if candidate > *entry {
                if candidate > limit {
                    return Err(WfBenchError::MalformedWorkflow(format!(
                        "level of task '{}' exceeds task count; graph still has a cycle",
                        child
                    )));
                }
                *entry = candidate;
                queue.push_back(child.to_string());
            }
        }
    }

    debug!(tasks = levels.len(), "assigned task levels");
    Ok(levels)
}

/// Group tasks by level: ascending level order, names sorted within a level.
pub fn group_by_level(levels: &BTreeMap<TaskName, usize>) -> Vec<Level> {
    let mut grouped: BTreeMap<usize, Level> = BTreeMap::new();
    for (name, level) in levels.iter() {
        grouped.entry(*level).or_default().push(name.clone());
    }

    grouped
        .into_values()
        .map(|mut names| {
            names.sort();
            names
        })
        .collect()
}

/// Make sure the destination of every removed edge is scheduled.
///
/// A destination missing from every level is appended as a trailing
/// singleton level, after everything computed from the acyclic remainder.
/// Returns the tasks that were appended.
pub fn reattach_orphans(levels: &mut Vec<Level>, removed: &[RemovedEdge]) -> Vec<TaskName> {
    let mut scheduled: BTreeSet<TaskName> = levels.iter().flatten().cloned().collect();
    let mut appended = Vec::new();

    for edge in removed {
        if scheduled.insert(edge.to.clone()) {
            debug!(
                task = %edge.to,
                from = %edge.from,
                "task only reachable via removed edge; appending trailing level"
            );
            levels.push(vec![edge.to.clone()]);
            appended.push(edge.to.clone());
        }
    }

    appended
}
