use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Platform hosting the benchmark workers.
///
/// - `Local`: a single worker listening on a fixed local endpoint.
/// - `Knative`: each task is POSTed to the `api_url` recorded in its command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Local,
    Knative,
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Platform::Local),
            "knative" => Ok(Platform::Knative),
            other => Err(format!(
                "invalid platform: {other} (expected \"local\" or \"knative\")"
            )),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Local => f.write_str("local"),
            Platform::Knative => f.write_str("knative"),
        }
    }
}

/// Direction of a declared task file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileLink {
    Input,
    Output,
}

/// How the driver decides when a task may be dispatched.
///
/// - `Levels`: one level at a time with a join barrier between levels
///   (default).
/// - `Dependencies`: a task becomes eligible as soon as every parent in the
///   residual graph has succeeded, independent of level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleMode {
    Levels,
    Dependencies,
}

impl Default for ScheduleMode {
    fn default() -> Self {
        ScheduleMode::Levels
    }
}

impl FromStr for ScheduleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "levels" => Ok(ScheduleMode::Levels),
            "dependencies" | "deps" => Ok(ScheduleMode::Dependencies),
            other => Err(format!(
                "invalid schedule mode: {other} (expected \"levels\" or \"dependencies\")"
            )),
        }
    }
}
