// src/watch/readiness.rs

//! Readiness checks against the run's result directory.
//!
//! A task is ready once every one of its declared input filenames shows up
//! in a listing of `<locality>/<run_id>`. Workers write their outputs there,
//! so the directory is the only completion signal the driver gets.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::errors::{Result, WfBenchError};
use crate::fs::FileSystem;

#[derive(Debug, Clone)]
pub struct ReadinessProbe {
    fs: Arc<dyn FileSystem>,
    dir: PathBuf,
}

impl ReadinessProbe {
    pub fn new(fs: Arc<dyn FileSystem>, dir: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            dir: dir.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn filesystem(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    /// Current listing of the result directory. A missing directory is empty.
    pub fn list_names(&self) -> Result<BTreeSet<String>> {
        let names = self.fs.list_names(&self.dir)?;
        Ok(names.into_iter().collect())
    }

    /// Declared inputs not present in the listing yet.
    pub fn missing(&self, inputs: &[String]) -> Result<Vec<String>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let present = self.list_names()?;
        Ok(inputs
            .iter()
            .filter(|name| !present.contains(name.as_str()))
            .cloned()
            .collect())
    }

    /// Like [`Self::missing`], but lists the directory on the blocking pool
    /// so a slow mount never stalls the runtime thread.
    pub async fn missing_blocking(&self, inputs: &[String]) -> Result<Vec<String>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let probe = self.clone();
        let inputs = inputs.to_vec();
        tokio::task::spawn_blocking(move || probe.missing(&inputs))
            .await
            .map_err(|err| WfBenchError::Other(anyhow!("directory listing task failed: {err}")))?
    }

    /// `true` iff every input is present. No inputs means ready.
    pub fn is_ready(&self, inputs: &[String]) -> Result<bool> {
        Ok(self.missing(inputs)?.is_empty())
    }

    /// `true` iff every name in `outputs` is present. No outputs means
    /// nothing is missing.
    pub fn all_present(&self, outputs: &[String]) -> Result<bool> {
        Ok(self.missing(outputs)?.is_empty())
    }

    /// Poll until `inputs` are all present or `timeout` elapses.
    ///
    /// Returns the number of checks made. A failed listing counts as "not
    /// ready yet" and polling continues until the deadline.
    pub async fn wait_until_ready(
        &self,
        task: &str,
        inputs: &[String],
        interval: Duration,
        timeout: Duration,
    ) -> Result<u32> {
        let started = Instant::now();
        let deadline = started + timeout;
        let mut checks: u32 = 0;

        loop {
            checks += 1;
            match self.missing_blocking(inputs).await {
                Ok(missing) if missing.is_empty() => {
                    debug!(task = %task, checks, "inputs ready");
                    return Ok(checks);
                }
                Ok(missing) => {
                    trace!(task = %task, checks, ?missing, "inputs not ready");
                }
                Err(err) => {
                    warn!(task = %task, dir = ?self.dir, error = %err, "listing result directory failed");
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(WfBenchError::ReadinessTimeout {
                    task: task.to_string(),
                    waited: now.duration_since(started),
                });
            }
            let pause = interval.min(deadline - now);
            tokio::time::sleep(pause).await;
        }
    }
}
