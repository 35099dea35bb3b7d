// src/dag/mod.rs

//! Workflow graph, linearization into levels, and run state.
//!
//! - [`graph`] holds the directed task graph (may contain cycles on input).
//! - [`cycles`] removes one edge per cycle until the graph is acyclic.
//! - [`levels`] assigns longest-path levels, groups them, and reattaches
//!   tasks only reachable through removed edges.
//! - [`run_state`] tracks what has been invoked in the current run.
//! - [`task_info`] holds per-task state machine types.
//! - [`scheduler`] / [`scheduler_step`] implement dependency-driven dispatch.

pub mod cycles;
pub mod graph;
pub mod levels;
pub mod run_state;
pub mod scheduler;
pub mod scheduler_step;
pub mod task_info;

use std::collections::BTreeMap;

use tracing::info;

pub use cycles::{RemovedEdge, break_cycles};
pub use graph::WorkflowGraph;
pub use levels::{Level, assign_levels, group_by_level, reattach_orphans};
pub use run_state::WorkflowRunState;
pub use scheduler::Scheduler;
pub use scheduler_step::SchedulerStep;
pub use task_info::{RunState, TaskState};

use crate::config::model::WorkflowDescription;
use crate::engine::TaskName;
use crate::errors::Result;

/// Everything derived from a workflow before any dispatch happens.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    /// Residual graph: acyclic after [`break_cycles`].
    pub graph: WorkflowGraph,
    pub removed_edges: Vec<RemovedEdge>,
    /// Longest-path level of every task in `graph`.
    pub level_of: BTreeMap<TaskName, usize>,
    /// Ordered levels, including any trailing singleton levels.
    pub levels: Vec<Level>,
}

impl ExecutionPlan {
    /// Build → break cycles → assign levels → group → reattach orphans.
    pub fn build(workflow: &WorkflowDescription) -> Result<Self> {
        let graph = WorkflowGraph::from_workflow(workflow)?;
        Self::from_graph(graph)
    }

    pub fn from_graph(mut graph: WorkflowGraph) -> Result<Self> {
        let removed_edges = break_cycles(&mut graph);
        let level_of = assign_levels(&graph)?;
        let mut levels = group_by_level(&level_of);
        reattach_orphans(&mut levels, &removed_edges);

        info!(
            tasks = graph.node_count(),
            edges = graph.edge_count(),
            levels = levels.len(),
            removed_edges = removed_edges.len(),
            "execution plan built"
        );

        Ok(Self {
            graph,
            removed_edges,
            level_of,
            levels,
        })
    }

    /// Index of the first level containing `task`.
    pub fn level_index_of(&self, task: &str) -> Option<usize> {
        self.levels
            .iter()
            .position(|level| level.iter().any(|name| name == task))
    }

    pub fn task_count(&self) -> usize {
        self.levels.iter().map(|level| level.len()).sum()
    }
}
