// src/config/mod.rs

//! Workflow description and runner settings.
//!
//! Responsibilities:
//! - Define the JSON-backed workflow model (`model.rs`).
//! - Define the optional TOML runner settings (`settings.rs`).
//! - Load both from disk (`loader.rs`).
//! - Validate structural invariants like dangling task references
//!   (`validate.rs`).

pub mod loader;
pub mod model;
pub mod settings;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_settings};
pub use model::{
    CommandSpec, FileSpec, RawTasks, RawWorkflowDocument, RawWorkflowSection, TaskSpec,
    WorkflowDescription,
};
pub use settings::{DriverSection, LocalSection, RetrySection, RunnerSettings};
pub use validate::validate_workflow;
