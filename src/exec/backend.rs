// src/exec/backend.rs

//! Pluggable invoker backend abstraction.
//!
//! The driver talks to an `Invoker` instead of a raw HTTP client. This makes
//! it easy to swap in a fake worker in tests while keeping the production
//! transport in [`HttpInvoker`].
//!
//! - `HttpInvoker` is the default implementation used by the CLI. It POSTs
//!   the request body as JSON with `reqwest`.
//! - Tests can provide their own `Invoker` that, for example, records which
//!   tasks were dispatched and writes their declared outputs into the result
//!   directory.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::debug;

use crate::errors::{Result, WfBenchError};

use super::invocation::InvocationRequest;

/// What came back from a successful call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResponse {
    pub status: u16,
    pub body: String,
}

/// Trait abstracting how a built request reaches a worker.
///
/// Implementations must map a transport failure or a non-2xx answer to
/// [`WfBenchError::Invocation`] so the retry policy can act on it.
pub trait Invoker: Send + Sync {
    fn invoke<'a>(
        &'a self,
        request: &'a InvocationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<InvocationResponse>> + Send + 'a>>;
}

/// Real HTTP invoker used in production.
#[derive(Debug, Clone)]
pub struct HttpInvoker {
    client: reqwest::Client,
}

impl HttpInvoker {
    /// Build a client whose requests give up after `request_timeout`.
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| WfBenchError::ConfigError(format!("building HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Invoker for HttpInvoker {
    fn invoke<'a>(
        &'a self,
        request: &'a InvocationRequest,
    ) -> Pin<Box<dyn Future<Output = Result<InvocationResponse>> + Send + 'a>> {
        Box::pin(async move {
            debug!(task = %request.task, url = %request.url, "POST invocation");

            let response = self
                .client
                .post(&request.url)
                .json(&request.body)
                .send()
                .await
                .map_err(|e| WfBenchError::Invocation {
                    task: request.task.clone(),
                    reason: format!("request to {} failed: {e}", request.url),
                })?;

            let status = response.status();
            // Body is informational; a read failure should not mask the status.
            let body = response.text().await.unwrap_or_default();

            if !status.is_success() {
                return Err(WfBenchError::Invocation {
                    task: request.task.clone(),
                    reason: format!("{} answered {status}", request.url),
                });
            }

            Ok(InvocationResponse {
                status: status.as_u16(),
                body,
            })
        })
    }
}
