// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{RawWorkflowDocument, WorkflowDescription};
use crate::config::settings::RunnerSettings;
use crate::errors::Result;

/// Load a workflow description from a given path and return the raw document.
///
/// This only performs JSON deserialization; it does **not** check that
/// child/parent references resolve. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawWorkflowDocument> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let document: RawWorkflowDocument = serde_json::from_str(&contents)?;

    Ok(document)
}

/// Load a workflow description from path and run structural validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads JSON.
/// - Indexes tasks by id (mapping or array form).
/// - Rejects unknown `children` / `parents` references.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<WorkflowDescription> {
    let raw = load_from_path(&path)?;
    let workflow = WorkflowDescription::try_from(raw)?;
    Ok(workflow)
}

/// Load runner settings from a TOML file.
///
/// `None` yields the defaults, so the settings file is entirely optional.
pub fn load_settings(path: Option<&Path>) -> Result<RunnerSettings> {
    match path {
        Some(path) => {
            let contents = fs::read_to_string(path)?;
            let settings: RunnerSettings = toml::from_str(&contents)?;
            settings.validate()?;
            Ok(settings)
        }
        None => Ok(RunnerSettings::default()),
    }
}
