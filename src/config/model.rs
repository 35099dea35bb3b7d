// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::engine::TaskName;
use crate::types::FileLink;

/// Workflow description as read from JSON, before validation.
///
/// This is the shape produced by the Knative translator:
///
/// ```json
/// {
///   "workflow": {
///     "name": "blast-knative",
///     "workflow_data_locality": "/data",
///     "workflow_manager_data_locality": "/mnt/shared/wfbench/data",
///     "tasks": {
///       "split_fasta_00000001": {
///         "children": ["blastall_00000002"],
///         "parents": ["blast-start"],
///         "files": [{"name": "f.txt", "link": "output", "sizeInBytes": 500}],
///         "command": {"api_url": "http://wfbench.example/wfbench", "arguments": [{"name": "split_fasta_00000001"}]}
///       }
///     }
///   }
/// }
/// ```
///
/// Unknown fields (`id`, `category`, `runtimeInSeconds`, ...) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RawWorkflowDocument {
    pub workflow: RawWorkflowSection,
}

/// The `workflow` object.
#[derive(Debug, Clone, Deserialize)]
pub struct RawWorkflowSection {
    pub name: String,

    /// Path of the shared storage as seen by the workers. Used to build the
    /// `workdir` sent with each invocation.
    pub workflow_data_locality: String,

    /// Path of the same shared storage as seen by this driver. Readiness
    /// checks list `<this>/<run_id>`; falls back to `workflow_data_locality`.
    #[serde(default)]
    pub workflow_manager_data_locality: Option<String>,

    pub tasks: RawTasks,
}

/// Tasks are a mapping keyed by id (translator output) or, in the raw
/// WfCommons form, an array of records that carry their own `name`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawTasks {
    Map(BTreeMap<String, TaskSpec>),
    List(Vec<TaskSpec>),
}

/// A single task record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskSpec {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub children: Vec<TaskName>,

    #[serde(default)]
    pub parents: Vec<TaskName>,

    #[serde(default)]
    pub files: Vec<FileSpec>,

    #[serde(default)]
    pub command: Option<CommandSpec>,
}

impl TaskSpec {
    /// Names of files declared as `input`, de-duplicated in declaration order.
    pub fn input_files(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for file in self.files.iter().filter(|f| f.link == FileLink::Input) {
            if !names.contains(&file.name) {
                names.push(file.name.clone());
            }
        }
        names
    }

    /// `(name, size)` for files declared as `output`, in declaration order.
    pub fn output_files(&self) -> Vec<(String, u64)> {
        self.files
            .iter()
            .filter(|f| f.link == FileLink::Output)
            .map(|f| (f.name.clone(), f.size_in_bytes))
            .collect()
    }

    /// Whether this task carries something to send to a worker.
    pub fn has_invocation(&self) -> bool {
        self.command
            .as_ref()
            .map(|c| !c.arguments.is_empty())
            .unwrap_or(false)
    }
}

/// `{name, link, sizeInBytes}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileSpec {
    pub name: String,
    pub link: FileLink,
    #[serde(rename = "sizeInBytes", default)]
    pub size_in_bytes: u64,
}

/// `command` object of a task.
///
/// `arguments` is kept as raw JSON: translator output holds a single object
/// of key/value pairs, raw WfCommons output holds strings such as
/// `"--percent-cpu 0.9"`. See [`crate::exec::invocation`] for the encoding.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandSpec {
    #[serde(default)]
    pub api_url: Option<String>,

    #[serde(default)]
    pub arguments: Vec<Value>,
}

/// A validated workflow description.
///
/// Every child/parent reference resolves to a task in `tasks`. Construct via
/// `TryFrom<RawWorkflowDocument>` or [`crate::config::load_and_validate`].
#[derive(Debug, Clone)]
pub struct WorkflowDescription {
    pub name: String,
    pub data_locality: PathBuf,
    pub manager_data_locality: Option<PathBuf>,
    pub tasks: BTreeMap<TaskName, TaskSpec>,
}

impl WorkflowDescription {
    pub(crate) fn new_unchecked(
        name: String,
        data_locality: PathBuf,
        manager_data_locality: Option<PathBuf>,
        tasks: BTreeMap<TaskName, TaskSpec>,
    ) -> Self {
        Self {
            name,
            data_locality,
            manager_data_locality,
            tasks,
        }
    }

    pub fn task(&self, name: &str) -> Option<&TaskSpec> {
        self.tasks.get(name)
    }

    /// Directory whose listing decides readiness for `run_id`.
    ///
    /// Workers write under `workflow_data_locality`, but the driver may see
    /// that storage at a different mount point. When
    /// `workflow_manager_data_locality` is set it names the driver's view and
    /// replaces the data locality for every readiness check.
    pub fn result_dir(&self, run_id: &str) -> PathBuf {
        let base: &Path = self
            .manager_data_locality
            .as_deref()
            .unwrap_or(&self.data_locality);
        base.join(run_id)
    }

    /// `workdir` sent to workers for `run_id`.
    pub fn workdir(&self, run_id: &str) -> PathBuf {
        self.data_locality.join(run_id)
    }
}
