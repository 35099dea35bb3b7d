// src/config/validate.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::config::model::{RawTasks, RawWorkflowDocument, TaskSpec, WorkflowDescription};
use crate::engine::TaskName;
use crate::errors::{Result, WfBenchError};

impl TryFrom<RawWorkflowDocument> for WorkflowDescription {
    type Error = crate::errors::WfBenchError;

    fn try_from(raw: RawWorkflowDocument) -> std::result::Result<Self, Self::Error> {
        let section = raw.workflow;
        let tasks = index_tasks(section.tasks)?;

        ensure_has_tasks(&tasks)?;
        validate_localities(&section.workflow_data_locality)?;
        validate_references(&tasks)?;
        warn_on_asymmetric_links(&tasks);

        let manager = section
            .workflow_manager_data_locality
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Ok(WorkflowDescription::new_unchecked(
            section.name,
            PathBuf::from(section.workflow_data_locality),
            manager,
            tasks,
        ))
    }
}

/// Re-run the structural checks on an already-built description.
///
/// Useful for descriptions assembled in code rather than loaded from JSON.
pub fn validate_workflow(workflow: &WorkflowDescription) -> Result<()> {
    ensure_has_tasks(&workflow.tasks)?;
    validate_references(&workflow.tasks)
}

fn index_tasks(raw: RawTasks) -> Result<BTreeMap<TaskName, TaskSpec>> {
    match raw {
        RawTasks::Map(map) => {
            for (key, task) in map.iter() {
                if key.trim().is_empty() {
                    return Err(WfBenchError::MalformedWorkflow(
                        "task ids must not be empty".to_string(),
                    ));
                }
                if let Some(name) = task.name.as_deref() {
                    if name != key {
                        warn!(task = %key, declared = %name, "task record name differs from its key; using the key");
                    }
                }
            }
            Ok(map)
        }
        RawTasks::List(list) => {
            let mut map = BTreeMap::new();
            for (idx, task) in list.into_iter().enumerate() {
                let name = match task.name.clone() {
                    Some(n) if !n.trim().is_empty() => n,
                    _ => {
                        return Err(WfBenchError::MalformedWorkflow(format!(
                            "task at index {idx} has no name"
                        )));
                    }
                };
                if map.insert(name.clone(), task).is_some() {
                    return Err(WfBenchError::MalformedWorkflow(format!(
                        "duplicate task id '{name}'"
                    )));
                }
            }
            Ok(map)
        }
    }
}

fn ensure_has_tasks(tasks: &BTreeMap<TaskName, TaskSpec>) -> Result<()> {
    if tasks.is_empty() {
        return Err(WfBenchError::MalformedWorkflow(
            "workflow must contain at least one task".to_string(),
        ));
    }
    Ok(())
}

fn validate_localities(data_locality: &str) -> Result<()> {
    if data_locality.trim().is_empty() {
        return Err(WfBenchError::ConfigError(
            "workflow.workflow_data_locality must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_references(tasks: &BTreeMap<TaskName, TaskSpec>) -> Result<()> {
    for (name, task) in tasks.iter() {
        for child in task.children.iter() {
            if !tasks.contains_key(child) {
                return Err(WfBenchError::MalformedWorkflow(format!(
                    "task '{}' has unknown child '{}'",
                    name, child
                )));
            }
        }
        for parent in task.parents.iter() {
            if !tasks.contains_key(parent) {
                return Err(WfBenchError::MalformedWorkflow(format!(
                    "task '{}' has unknown parent '{}'",
                    name, parent
                )));
            }
        }
    }
    Ok(())
}

/// Edges come from `children` only; a `parents` list that disagrees is
/// reported but does not change the graph.
fn warn_on_asymmetric_links(tasks: &BTreeMap<TaskName, TaskSpec>) {
    for (name, task) in tasks.iter() {
        for parent in task.parents.iter() {
            let listed = tasks
                .get(parent)
                .map(|p| p.children.iter().any(|c| c == name))
                .unwrap_or(false);
            if !listed {
                debug!(
                    task = %name,
                    parent = %parent,
                    "parent does not list task among its children; edge ignored"
                );
            }
        }
    }
}
