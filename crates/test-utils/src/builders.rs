#![allow(dead_code)]

use std::collections::BTreeMap;

use serde_json::{json, Value};

use wfbench_runner::config::{
    CommandSpec, FileSpec, RawTasks, RawWorkflowDocument, RawWorkflowSection, TaskSpec,
    WorkflowDescription,
};
use wfbench_runner::types::FileLink;

/// Builder for `WorkflowDescription` to simplify test setup.
pub struct WorkflowBuilder {
    name: String,
    data_locality: String,
    manager_data_locality: Option<String>,
    tasks: BTreeMap<String, TaskSpec>,
}

impl WorkflowBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            data_locality: "/data".to_string(),
            manager_data_locality: None,
            tasks: BTreeMap::new(),
        }
    }

    pub fn data_locality(mut self, path: impl AsRef<std::path::Path>) -> Self {
        self.data_locality = path.as_ref().display().to_string();
        self
    }

    pub fn manager_data_locality(mut self, path: impl AsRef<std::path::Path>) -> Self {
        self.manager_data_locality = Some(path.as_ref().display().to_string());
        self
    }

    pub fn with_task(mut self, name: &str, task: TaskSpec) -> Self {
        self.tasks.insert(name.to_string(), task);
        self
    }

    /// Add `from -> to`, creating either task if needed and keeping
    /// `children`/`parents` symmetric.
    pub fn edge(mut self, from: &str, to: &str) -> Self {
        let parent = self.tasks.entry(from.to_string()).or_default();
        if !parent.children.iter().any(|c| c == to) {
            parent.children.push(to.to_string());
        }
        let child = self.tasks.entry(to.to_string()).or_default();
        if !child.parents.iter().any(|p| p == from) {
            child.parents.push(from.to_string());
        }
        self
    }

    pub fn build_raw(self) -> RawWorkflowDocument {
        RawWorkflowDocument {
            workflow: RawWorkflowSection {
                name: self.name,
                workflow_data_locality: self.data_locality,
                workflow_manager_data_locality: self.manager_data_locality,
                tasks: RawTasks::Map(self.tasks),
            },
        }
    }

    pub fn build(self) -> WorkflowDescription {
        WorkflowDescription::try_from(self.build_raw())
            .expect("Failed to build valid workflow from builder")
    }

    /// The same workflow as the JSON document the loader reads.
    pub fn to_json(&self) -> Value {
        let tasks: serde_json::Map<String, Value> = self
            .tasks
            .iter()
            .map(|(name, task)| (name.clone(), task_to_json(task)))
            .collect();

        let mut workflow = json!({
            "name": self.name,
            "workflow_data_locality": self.data_locality,
            "tasks": tasks,
        });
        if let Some(manager) = self.manager_data_locality.as_ref() {
            workflow["workflow_manager_data_locality"] = json!(manager);
        }
        json!({ "workflow": workflow })
    }
}

fn task_to_json(task: &TaskSpec) -> Value {
    let files: Vec<Value> = task
        .files
        .iter()
        .map(|f| {
            json!({
                "name": f.name,
                "link": match f.link { FileLink::Input => "input", FileLink::Output => "output" },
                "sizeInBytes": f.size_in_bytes,
            })
        })
        .collect();

    let mut value = json!({
        "children": task.children,
        "parents": task.parents,
        "files": files,
    });
    if let Some(command) = task.command.as_ref() {
        let mut cmd = json!({ "arguments": command.arguments });
        if let Some(url) = command.api_url.as_ref() {
            cmd["api_url"] = json!(url);
        }
        value["command"] = cmd;
    }
    value
}

/// Builder for `TaskSpec`.
pub struct TaskBuilder {
    task: TaskSpec,
}

impl TaskBuilder {
    pub fn new() -> Self {
        Self {
            task: TaskSpec::default(),
        }
    }

    pub fn child(mut self, name: &str) -> Self {
        self.task.children.push(name.to_string());
        self
    }

    pub fn parent(mut self, name: &str) -> Self {
        self.task.parents.push(name.to_string());
        self
    }

    pub fn input(mut self, file: &str) -> Self {
        self.task.files.push(FileSpec {
            name: file.to_string(),
            link: FileLink::Input,
            size_in_bytes: 0,
        });
        self
    }

    pub fn output(mut self, file: &str, size: u64) -> Self {
        self.task.files.push(FileSpec {
            name: file.to_string(),
            link: FileLink::Output,
            size_in_bytes: size,
        });
        self
    }

    pub fn argument(mut self, argument: Value) -> Self {
        self.task
            .command
            .get_or_insert_with(CommandSpec::default)
            .arguments
            .push(argument);
        self
    }

    pub fn api_url(mut self, url: &str) -> Self {
        self.task
            .command
            .get_or_insert_with(CommandSpec::default)
            .api_url = Some(url.to_string());
        self
    }

    /// Translator-style arguments: `[{"name": <name>, "cpu-work": 100}]`.
    pub fn wfbench(self, name: &str) -> Self {
        self.argument(json!({ "name": name, "cpu-work": 100 }))
    }

    pub fn build(self) -> TaskSpec {
        self.task
    }
}

impl Default for TaskBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Diamond `A -> {B, C} -> D`; every task writes `<name>.out` and reads its
/// parents' outputs.
pub fn diamond(data_locality: impl AsRef<std::path::Path>) -> WorkflowBuilder {
    WorkflowBuilder::new("diamond")
        .data_locality(data_locality)
        .with_task(
            "A",
            TaskBuilder::new().child("B").child("C").output("A.out", 10).wfbench("A").build(),
        )
        .with_task(
            "B",
            TaskBuilder::new()
                .parent("A")
                .child("D")
                .input("A.out")
                .output("B.out", 20)
                .wfbench("B")
                .build(),
        )
        .with_task(
            "C",
            TaskBuilder::new()
                .parent("A")
                .child("D")
                .input("A.out")
                .output("C.out", 30)
                .wfbench("C")
                .build(),
        )
        .with_task(
            "D",
            TaskBuilder::new()
                .parent("B")
                .parent("C")
                .input("B.out")
                .input("C.out")
                .output("D.out", 40)
                .wfbench("D")
                .build(),
        )
}
