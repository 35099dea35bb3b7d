// src/errors.rs

//! Crate-wide error type and result alias.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WfBenchError {
    /// A child/parent reference points at a task that does not exist, or the
    /// task set is otherwise structurally unusable. Fatal before dispatch.
    #[error("Malformed workflow: {0}")]
    MalformedWorkflow(String),

    /// A task's command arguments cannot be turned into a request body.
    #[error("Argument encoding error for task '{task}': {reason}")]
    ArgumentEncoding { task: String, reason: String },

    /// A task's declared inputs never appeared in the result directory.
    #[error("Task '{task}' inputs not ready after {waited:?}")]
    ReadinessTimeout { task: String, waited: Duration },

    /// The remote call failed or returned a non-success status.
    #[error("Invocation of task '{task}' failed: {reason}")]
    Invocation { task: String, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WfBenchError>;
