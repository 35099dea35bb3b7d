use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Context;

use wfbench_runner::errors::{Result, WfBenchError};
use wfbench_runner::exec::{InvocationRequest, InvocationResponse, Invoker};
use wfbench_runner::fs::FileSystem;

#[derive(Debug, Default)]
struct State {
    calls: Vec<InvocationRequest>,
    /// Remaining failures before a task's call succeeds.
    fail_budget: HashMap<String, u32>,
    always_fail: HashSet<String>,
    latency_for: HashMap<String, Duration>,
}

/// A fake worker that:
/// - records every request it receives
/// - writes each file named in the body's `out` into the result directory,
///   the way a real worker signals completion
/// - can be told to fail a task a number of times, or always.
#[derive(Debug, Clone)]
pub struct FakeWorker {
    fs: Arc<dyn FileSystem>,
    result_dir: Option<PathBuf>,
    latency: Duration,
    write_outputs: bool,
    state: Arc<Mutex<State>>,
}

impl FakeWorker {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            result_dir: None,
            latency: Duration::ZERO,
            write_outputs: true,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Write outputs here instead of the request's `workdir`.
    pub fn result_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.result_dir = Some(dir.into());
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Accept requests without producing any output files.
    pub fn without_outputs(mut self) -> Self {
        self.write_outputs = false;
        self
    }

    /// Delay only `task`'s answers.
    pub fn latency_for(self, task: &str, latency: Duration) -> Self {
        self.lock().latency_for.insert(task.to_string(), latency);
        self
    }

    pub fn fail_times(self, task: &str, times: u32) -> Self {
        self.lock().fail_budget.insert(task.to_string(), times);
        self
    }

    pub fn fail_always(self, task: &str) -> Self {
        self.lock().always_fail.insert(task.to_string());
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn calls(&self) -> Vec<InvocationRequest> {
        self.lock().calls.clone()
    }

    /// Distinct tasks that reached the worker, sorted.
    pub fn dispatched_tasks(&self) -> Vec<String> {
        let mut tasks: Vec<String> = self.lock().calls.iter().map(|c| c.task.clone()).collect();
        tasks.sort();
        tasks.dedup();
        tasks
    }

    pub fn call_count(&self, task: &str) -> usize {
        self.lock().calls.iter().filter(|c| c.task == task).count()
    }

    fn should_fail(&self, task: &str) -> bool {
        let mut state = self.lock();
        if state.always_fail.contains(task) {
            return true;
        }
        match state.fail_budget.get_mut(task) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }

    fn produce_outputs(&self, request: &InvocationRequest) -> Result<()> {
        let dir = match self.result_dir.as_ref() {
            Some(dir) => dir.clone(),
            None => request
                .body
                .get("workdir")
                .and_then(|w| w.as_str())
                .map(PathBuf::from)
                .ok_or_else(|| WfBenchError::Invocation {
                    task: request.task.clone(),
                    reason: "request body has no workdir".to_string(),
                })?,
        };

        if let Some(out) = request.body.get("out").and_then(|o| o.as_object()) {
            for name in out.keys() {
                let path = dir.join(name);
                self.fs
                    .write(&path, request.task.as_bytes())
                    .with_context(|| format!("fake worker writing {:?}", path))?;
            }
        }
        Ok(())
    }
}

impl Invoker for FakeWorker {
    fn invoke<'a>(
        &'a self,
        request: &'a InvocationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<InvocationResponse>> + Send + 'a>> {
        Box::pin(async move {
            self.lock().calls.push(request.clone());

            let latency = self
                .lock()
                .latency_for
                .get(&request.task)
                .copied()
                .unwrap_or(self.latency);
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }

            if self.should_fail(&request.task) {
                return Err(WfBenchError::Invocation {
                    task: request.task.clone(),
                    reason: "fake worker refused".to_string(),
                });
            }

            if self.write_outputs {
                self.produce_outputs(request)?;
            }

            Ok(InvocationResponse {
                status: 200,
                body: String::new(),
            })
        })
    }
}
