// src/dag/cycles.rs

//! Cycle removal.

use serde::Serialize;
use tracing::{debug, warn};

use crate::dag::graph::WorkflowGraph;
use crate::engine::TaskName;

/// An edge excised to break a cycle.
///
/// Kept so that `to` can still be scheduled if the removal left it out of
/// every level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedEdge {
    pub from: TaskName,
    pub to: TaskName,
}

/// Remove one edge per detected cycle until `graph` admits a topological order.
///
/// Each round tries a topological sort; on failure, a cycle through the task
/// the sort reported is located and its first edge removed. Every round
/// removes exactly one edge, so this terminates on any finite graph.
///
/// Returns the removed edges in removal order (empty if `graph` was acyclic).
pub fn break_cycles(graph: &mut WorkflowGraph) -> Vec<RemovedEdge> {
    let mut removed = Vec::new();

    loop {
        let on_cycle = match graph.topological_order() {
            Ok(_) => break,
            Err(node) => node,
        };

        let Some(cycle) = graph
            .find_cycle(Some(&on_cycle))
            .and_then(|edges| edges.into_iter().next())
        else {
            // toposort and the DFS disagree; nothing sensible left to remove.
            warn!(task = %on_cycle, "topological sort failed but no cycle was found");
            break;
        };

        let (from, to) = cycle;
        if !graph.remove_edge(&from, &to) {
            warn!(from = %from, to = %to, "cycle edge vanished before removal");
            break;
        }

        debug!(from = %from, to = %to, "removed edge to break cycle");
        removed.push(RemovedEdge { from, to });
    }

    if !removed.is_empty() {
        warn!(
            count = removed.len(),
            edges = ?removed,
            "workflow graph contained cycles; edges removed"
        );
    }

    removed
}
