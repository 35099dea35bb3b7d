// src/exec/invocation.rs

//! Invocation builder: task arguments + declared files -> HTTP request.
//!
//! The body sent to a worker looks like:
//!
//! ```json
//! {"name": "split_fasta_00000001", "percent-cpu": 0.9, "cpu-work": 100,
//!  "out": {"split_fasta_00000001_output.txt": 204082},
//!  "inputs": ["split_fasta_00000001_input.txt"],
//!  "workdir": "/data/run-1"}
//! ```
//!
//! `name` comes first, then the task's own arguments, then the computed
//! `out`/`inputs`, and `workdir` always last.

use std::fmt;
use std::path::Path;

use serde_json::{Map, Number, Value};
use tracing::trace;

use crate::config::model::TaskSpec;
use crate::config::settings::DEFAULT_LOCAL_ENDPOINT;
use crate::engine::TaskName;
use crate::errors::{Result, WfBenchError};
use crate::types::Platform;

/// Keys the builder computes itself; argument-supplied values are dropped.
const RESERVED_KEYS: [&str; 4] = ["name", "out", "inputs", "workdir"];

/// A fully built request for one task.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRequest {
    pub task: TaskName,
    pub platform: Platform,
    pub url: String,
    pub body: Value,
}

/// Where a platform sends a task's request.
pub trait InvocationTarget: Send + Sync + fmt::Debug {
    fn platform(&self) -> Platform;

    /// URL the request for `task` is POSTed to.
    fn endpoint_for(&self, task_name: &str, task: &TaskSpec) -> Result<String>;

    /// Build `(url, body)` for `task`.
    fn build_request(
        &self,
        task_name: &str,
        task: &TaskSpec,
        workdir: &Path,
    ) -> Result<InvocationRequest> {
        let url = self.endpoint_for(task_name, task)?;
        let body = encode_body(task_name, task, workdir)?;
        Ok(InvocationRequest {
            task: task_name.to_string(),
            platform: self.platform(),
            url,
            body: Value::Object(body),
        })
    }
}

/// Every task goes to one fixed local worker.
#[derive(Debug, Clone)]
pub struct LocalTarget {
    endpoint: String,
}

impl LocalTarget {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Default for LocalTarget {
    fn default() -> Self {
        Self::new(DEFAULT_LOCAL_ENDPOINT)
    }
}

impl InvocationTarget for LocalTarget {
    fn platform(&self) -> Platform {
        Platform::Local
    }

    fn endpoint_for(&self, _task_name: &str, _task: &TaskSpec) -> Result<String> {
        Ok(self.endpoint.clone())
    }
}

/// Each task goes to the `api_url` recorded in its command.
#[derive(Debug, Clone, Default)]
pub struct KnativeTarget;

impl InvocationTarget for KnativeTarget {
    fn platform(&self) -> Platform {
        Platform::Knative
    }

    fn endpoint_for(&self, task_name: &str, task: &TaskSpec) -> Result<String> {
        task.command
            .as_ref()
            .and_then(|c| c.api_url.as_deref())
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(String::from)
            .ok_or_else(|| WfBenchError::ArgumentEncoding {
                task: task_name.to_string(),
                reason: "knative target requires command.api_url".to_string(),
            })
    }
}

/// Target for `platform`; `local_endpoint` only matters for `Local`.
pub fn target_for(platform: Platform, local_endpoint: &str) -> Box<dyn InvocationTarget> {
    match platform {
        Platform::Local => Box::new(LocalTarget::new(local_endpoint)),
        Platform::Knative => Box::new(KnativeTarget),
    }
}

/// Merge a task's arguments and declared files into one JSON object.
///
/// Argument forms:
/// - object: every entry copied as-is (strings stay strings, lists/maps stay
///   JSON, numbers stay numbers);
/// - `"--key value"`: `value` parsed as JSON list/map, then integer, then
///   float, falling back to a string;
/// - bare string: the first one is `name`, later ones are input filenames
///   (superseded by the declared `input` files).
///
/// A `null` value, a `--key` without value, or a bare non-string argument is
/// an [`WfBenchError::ArgumentEncoding`].
pub fn encode_body(task_name: &str, task: &TaskSpec, workdir: &Path) -> Result<Map<String, Value>> {
    let mut args: Map<String, Value> = Map::new();

    if let Some(command) = task.command.as_ref() {
        for argument in command.arguments.iter() {
            match argument {
                Value::Object(entries) => {
                    for (key, value) in entries.iter() {
                        if value.is_null() {
                            return Err(encoding_error(
                                task_name,
                                format!("argument '{key}' has no value"),
                            ));
                        }
                        args.insert(key.clone(), value.clone());
                    }
                }
                Value::String(raw) => encode_string_argument(task_name, raw, &mut args)?,
                Value::Null => {
                    return Err(encoding_error(task_name, "null argument".to_string()));
                }
                other => {
                    return Err(encoding_error(
                        task_name,
                        format!("unsupported positional argument {other}"),
                    ));
                }
            }
        }
    }

    let mut body = Map::new();
    body.insert(
        "name".to_string(),
        args.get("name")
            .cloned()
            .unwrap_or_else(|| Value::String(task_name.to_string())),
    );
    for (key, value) in args.into_iter() {
        if !RESERVED_KEYS.contains(&key.as_str()) {
            body.insert(key, value);
        }
    }

    let out: Map<String, Value> = task
        .output_files()
        .into_iter()
        .map(|(name, size)| (name, Value::Number(Number::from(size))))
        .collect();
    let inputs: Vec<Value> = task.input_files().into_iter().map(Value::String).collect();

    body.insert("out".to_string(), Value::Object(out));
    body.insert("inputs".to_string(), Value::Array(inputs));
    body.insert(
        "workdir".to_string(),
        Value::String(workdir.display().to_string()),
    );

    Ok(body)
}

fn encode_string_argument(
    task_name: &str,
    raw: &str,
    args: &mut Map<String, Value>,
) -> Result<()> {
    let trimmed = raw.trim();

    if let Some(rest) = trimmed.strip_prefix("--") {
        let (key, value) = match rest.split_once(char::is_whitespace) {
            Some((key, value)) => (key, value.trim()),
            None => (rest, ""),
        };
        if key.is_empty() {
            return Err(encoding_error(task_name, format!("malformed argument '{raw}'")));
        }
        if value.is_empty() {
            return Err(encoding_error(
                task_name,
                format!("argument '--{key}' has no value"),
            ));
        }
        args.insert(key.to_string(), parse_value(value));
        return Ok(());
    }

    if trimmed.is_empty() {
        return Err(encoding_error(task_name, "empty positional argument".to_string()));
    }

    if args.contains_key("name") {
        trace!(task = %task_name, input = %trimmed, "positional input superseded by declared files");
    } else {
        args.insert("name".to_string(), Value::String(trimmed.to_string()));
    }
    Ok(())
}

fn parse_value(value: &str) -> Value {
    if value.starts_with('{') || value.starts_with('[') {
        if let Ok(parsed) = serde_json::from_str::<Value>(value) {
            return parsed;
        }
    }
    if let Ok(int) = value.parse::<i64>() {
        return Value::Number(Number::from(int));
    }
    if let Ok(float) = value.parse::<f64>() {
        if let Some(num) = Number::from_f64(float) {
            return Value::Number(num);
        }
    }
    Value::String(value.to_string())
}

fn encoding_error(task_name: &str, reason: String) -> WfBenchError {
    WfBenchError::ArgumentEncoding {
        task: task_name.to_string(),
        reason,
    }
}
