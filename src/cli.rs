// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::types::{Platform, ScheduleMode};

/// Command-line arguments for `wfbench-runner`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "wfbench-runner",
    version,
    about = "Drive a serverless workflow benchmark level by level.",
    long_about = None
)]
pub struct CliArgs {
    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WFBENCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run one workflow experiment against a platform.
    #[command(visible_alias = "r")]
    Run(RunArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Path to the workflow description (JSON).
    #[arg(value_name = "EXPERIMENT")]
    pub experiment: PathBuf,

    /// Identifier of this run; results land in `<locality>/<RUN_ID>`.
    #[arg(value_name = "RUN_ID")]
    pub run_id: String,

    /// Cores available to the workers. Recorded in the report only.
    #[arg(value_name = "CORES")]
    pub cores: u32,

    /// Target platform: `local` or `knative`.
    #[arg(value_name = "PLATFORM")]
    pub platform: Platform,

    /// Optional runner settings file (TOML).
    #[arg(long, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Schedule mode: `levels` (default) or `dependencies`.
    #[arg(long, value_name = "MODE")]
    pub schedule: Option<ScheduleMode>,

    /// Override `[driver].poll_interval_ms`.
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Override `[driver].readiness_timeout_secs`.
    #[arg(long, value_name = "SECS")]
    pub readiness_timeout_secs: Option<u64>,

    /// Write the run report as JSON to this path.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Parse + validate, print levels and removed edges, but don't invoke
    /// anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
