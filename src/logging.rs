// src/logging.rs

//! Logging setup for `wfbench-runner` using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log filter:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `WFBENCH_LOG` environment variable (a level such as "debug", or a full
//!    filter such as "wfbench_runner=debug,reqwest=warn")
//! 3. default to `info`
//!
//! Logs are sent to STDERR so that stdout stays free for dry-run output.

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Environment variable consulted when no `--log-level` is given.
pub const LOG_ENV_VAR: &str = "WFBENCH_LOG";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(lvl) => EnvFilter::new(level_directive(lvl)),
        None => EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info")),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to initialise logging: {e}"))?;

    Ok(())
}

fn level_directive(lvl: LogLevel) -> &'static str {
    match lvl {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
