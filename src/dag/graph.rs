// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::config::model::WorkflowDescription;
use crate::engine::TaskName;
use crate::errors::{Result, WfBenchError};

/// Directed task graph keyed by task name (parent -> child edges).
///
/// Nodes are inserted in lexicographic order so that every traversal below is
/// deterministic for a given workflow. Unlike a validated DAG, this graph may
/// contain cycles until [`crate::dag::break_cycles`] has run over it.
#[derive(Debug, Clone)]
pub struct WorkflowGraph {
    graph: DiGraph<TaskName, ()>,
    index: HashMap<TaskName, NodeIndex>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

impl WorkflowGraph {
    /// Build the graph from a workflow's `children` lists.
    pub fn from_workflow(workflow: &WorkflowDescription) -> Result<Self> {
        Self::from_adjacency(
            workflow
                .tasks
                .iter()
                .map(|(name, task)| (name.clone(), task.children.clone())),
        )
    }

    /// Build the graph from `(task, children)` pairs.
    ///
    /// The edge set is exactly the union of `(task, child)` pairs; duplicate
    /// children collapse into one edge. A child that is not itself listed as a
    /// task is a [`WfBenchError::MalformedWorkflow`].
    pub fn from_adjacency<I, S>(adjacency: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<S>)>,
        S: Into<TaskName>,
    {
        let entries: Vec<(TaskName, Vec<TaskName>)> = adjacency
            .into_iter()
            .map(|(name, children)| {
                (
                    name.into(),
                    children.into_iter().map(Into::into).collect(),
                )
            })
            .collect();

        let mut names: Vec<&TaskName> = entries.iter().map(|(name, _)| name).collect();
        names.sort();
        names.dedup();

        let mut graph = DiGraph::new();
        let mut index = HashMap::new();
        for name in names {
            let idx = graph.add_node(name.clone());
            index.insert(name.clone(), idx);
        }

        for (name, children) in entries.iter() {
            let Some(&from) = index.get(name) else {
                continue;
            };
            for child in children {
                let Some(&to) = index.get(child) else {
                    return Err(WfBenchError::MalformedWorkflow(format!(
                        "task '{}' declares unknown child '{}'",
                        name, child
                    )));
                };
                graph.update_edge(from, to, ());
            }
        }

        Ok(Self { graph, index })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All task names, in lexicographic order.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.graph.node_indices().map(|idx| self.graph[idx].as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Immediate children of a task, sorted.
    pub fn children_of(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Outgoing)
    }

    /// Immediate parents of a task, sorted.
    pub fn parents_of(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Incoming)
    }

    pub fn in_degree(&self, name: &str) -> usize {
        self.index
            .get(name)
            .map(|&idx| {
                self.graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Tasks with no incoming edge, sorted.
    pub fn sources(&self) -> Vec<&str> {
        self.tasks().filter(|name| self.in_degree(name) == 0).collect()
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&a), Some(&b)) => self.graph.find_edge(a, b).is_some(),
            _ => false,
        }
    }

    /// All edges as `(parent, child)` pairs, sorted.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        let mut edges: Vec<(&str, &str)> = self
            .graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| (self.graph[a].as_str(), self.graph[b].as_str()))
            .collect();
        edges.sort();
        edges
    }

    /// Remove the edge `from -> to`. Returns `false` if there was no such edge.
    pub fn remove_edge(&mut self, from: &str, to: &str) -> bool {
        let (Some(&a), Some(&b)) = (self.index.get(from), self.index.get(to)) else {
            return false;
        };
        match self.graph.find_edge(a, b) {
            Some(edge) => self.graph.remove_edge(edge).is_some(),
            None => false,
        }
    }

    pub fn is_acyclic(&self) -> bool {
        toposort(&self.graph, None).is_ok()
    }

    /// A topological order of the tasks, or the name of a task that sits on a
    /// cycle.
    pub fn topological_order(&self) -> std::result::Result<Vec<&str>, TaskName> {
        toposort(&self.graph, None)
            .map(|order| order.into_iter().map(|idx| self.graph[idx].as_str()).collect())
            .map_err(|cycle| self.graph[cycle.node_id()].clone())
    }

    /// Find one directed cycle, returned as its edges in path order.
    ///
    /// The depth-first walk starts at `start` (when given and known), then
    /// continues over the remaining tasks in lexicographic order. The first
    /// returned edge leaves the first task of the cycle that the walk entered.
    pub fn find_cycle(&self, start: Option<&str>) -> Option<Vec<(TaskName, TaskName)>> {
        let mut marks = vec![Mark::Unvisited; self.graph.node_count()];

        let first = start.and_then(|name| self.index.get(name).copied());
        let roots = first.into_iter().chain(self.graph.node_indices());

        for root in roots {
            if marks[root.index()] != Mark::Unvisited {
                continue;
            }

            // Explicit stack of (node, sorted successors, next successor).
            let mut stack: Vec<(NodeIndex, Vec<NodeIndex>, usize)> =
                vec![(root, self.sorted_successors(root), 0)];
            marks[root.index()] = Mark::OnPath;

            while !stack.is_empty() {
                let next = {
                    let Some(frame) = stack.last_mut() else {
                        break;
                    };
                    if frame.2 < frame.1.len() {
                        let n = frame.1[frame.2];
                        frame.2 += 1;
                        Some(n)
                    } else {
                        None
                    }
                };

                match next {
                    Some(node) => match marks[node.index()] {
                        Mark::Unvisited => {
                            marks[node.index()] = Mark::OnPath;
                            stack.push((node, self.sorted_successors(node), 0));
                        }
                        Mark::OnPath => {
                            return Some(self.cycle_edges(&stack, node));
                        }
                        Mark::Done => {}
                    },
                    None => {
                        if let Some((node, _, _)) = stack.pop() {
                            marks[node.index()] = Mark::Done;
                        }
                    }
                }
            }
        }

        None
    }

    fn cycle_edges(
        &self,
        stack: &[(NodeIndex, Vec<NodeIndex>, usize)],
        back_to: NodeIndex,
    ) -> Vec<(TaskName, TaskName)> {
        let start = stack
            .iter()
            .position(|(node, _, _)| *node == back_to)
            .unwrap_or(0);
        let path: Vec<NodeIndex> = stack[start..].iter().map(|(node, _, _)| *node).collect();

        let mut edges: Vec<(TaskName, TaskName)> = path
            .windows(2)
            .map(|pair| (self.graph[pair[0]].clone(), self.graph[pair[1]].clone()))
            .collect();
        if let Some(&last) = path.last() {
            edges.push((self.graph[last].clone(), self.graph[back_to].clone()));
        }
        edges
    }

    fn sorted_successors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut succ: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .collect();
        succ.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));
        succ.dedup();
        succ
    }

    fn neighbors(&self, name: &str, dir: Direction) -> Vec<&str> {
        let Some(&idx) = self.index.get(name) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self
            .graph
            .neighbors_directed(idx, dir)
            .map(|n| self.graph[n].as_str())
            .collect();
        out.sort();
        out.dedup();
        out
    }
}
