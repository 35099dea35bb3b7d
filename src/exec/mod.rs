// src/exec/mod.rs

//! Invocation layer.
//!
//! This module is responsible for turning a task into a request, sending it
//! to a worker, and reporting back the task's outcome.
//!
//! - [`invocation`] builds `(url, body)` for the `local` and `knative`
//!   targets.
//! - [`backend`] provides the `Invoker` trait and the `reqwest`-based
//!   `HttpInvoker`; tests replace it with a fake worker.
//! - [`retry`] holds the bounded exponential backoff policy.
//! - [`task_runner`] drives one task from readiness polling to completion.

pub mod backend;
pub mod invocation;
pub mod retry;
pub mod task_runner;

pub use backend::{HttpInvoker, InvocationResponse, Invoker};
pub use invocation::{
    InvocationRequest, InvocationTarget, KnativeTarget, LocalTarget, encode_body, target_for,
};
pub use retry::RetryPolicy;
pub use task_runner::{TaskRun, UnitContext, run_task};
