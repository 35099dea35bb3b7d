// src/exec/retry.rs

//! Bounded retry with capped exponential backoff.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::errors::{Result, WfBenchError};

/// Retry configuration for worker invocations.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Cap on any single delay.
    pub max_delay: Duration,
    /// Growth factor between consecutive delays.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay to wait after the failed attempt number `attempt` (0-indexed).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error,
    /// or the attempts run out.
    ///
    /// Returns the final result together with the number of attempts made.
    pub async fn execute<F, Fut, T>(&self, label: &str, mut operation: F) -> (Result<T>, u32)
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            let result = operation(attempt).await;
            attempt += 1;

            match result {
                Ok(value) => return (Ok(value), attempt),
                Err(err) if !is_retryable(&err) || attempt >= self.max_attempts() => {
                    return (Err(err), attempt);
                }
                Err(err) => {
                    let delay = self.delay_for(attempt - 1);
                    warn!(
                        task = %label,
                        attempt,
                        max_attempts = self.max_attempts(),
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "invocation attempt failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

fn is_retryable(err: &WfBenchError) -> bool {
    matches!(
        err,
        WfBenchError::Invocation { .. } | WfBenchError::IoError(_) | WfBenchError::Other(_)
    )
}
