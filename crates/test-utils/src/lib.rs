pub mod builders;
pub mod fake_worker;

use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

use wfbench_runner::engine::RunOptions;
use wfbench_runner::exec::RetryPolicy;
use wfbench_runner::types::ScheduleMode;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Run options with millisecond-scale polling and retries.
pub fn fast_options(schedule: ScheduleMode) -> RunOptions {
    RunOptions {
        poll_interval: Duration::from_millis(10),
        readiness_timeout: Duration::from_millis(500),
        retry: RetryPolicy {
            max_retries: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            multiplier: 2.0,
        },
        schedule,
    }
}
