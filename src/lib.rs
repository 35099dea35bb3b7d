// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, Command, RunArgs};
use crate::config::loader::{load_and_validate, load_settings};
use crate::config::model::WorkflowDescription;
use crate::config::settings::RunnerSettings;
use crate::dag::ExecutionPlan;
use crate::engine::{ExecutionDriver, RunOptions};
use crate::exec::{HttpInvoker, target_for};
use crate::fs::{FileSystem, RealFileSystem};

/// High-level entry point used by `main.rs`.
pub async fn run(args: CliArgs) -> Result<()> {
    match args.command {
        Command::Run(run_args) => run_experiment(run_args).await,
    }
}

/// This wires together:
/// - settings + workflow loading
/// - execution plan (cycle breaking, levels)
/// - invocation target + HTTP invoker
/// - the execution driver
/// - Ctrl-C handling
async fn run_experiment(args: RunArgs) -> Result<()> {
    let settings = load_settings(args.settings.as_deref())?;
    let workflow = load_and_validate(&args.experiment)?;
    let plan = ExecutionPlan::build(&workflow)?;

    if args.dry_run {
        print_dry_run(&workflow, &plan);
        return Ok(());
    }

    let options = run_options(&settings, &args);
    let invoker = HttpInvoker::new(Duration::from_secs(settings.driver.request_timeout_secs))?;
    let target = target_for(args.platform, &settings.local.endpoint);
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    let driver = ExecutionDriver::new(
        workflow,
        plan,
        target,
        invoker,
        Arc::clone(&fs),
        args.run_id.clone(),
        args.cores,
        options,
    );

    // Ctrl-C → stop waiting; in-flight requests are abandoned.
    let report = tokio::select! {
        report = driver.run() => report?,
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(|e| anyhow!("failed to listen for Ctrl+C: {e}"))?;
            warn!(run_id = %args.run_id, "interrupted; abandoning run");
            return Err(anyhow!("run {} interrupted", args.run_id));
        }
    };

    if let Some(path) = args.report.as_deref() {
        report.write_json(fs.as_ref(), path)?;
    }

    if !report.succeeded() {
        info!(failed = report.failed_tasks().len(), "run completed with failed tasks");
    }
    Ok(())
}

/// Settings file values, overridden by CLI flags.
fn run_options(settings: &RunnerSettings, args: &RunArgs) -> RunOptions {
    let mut options = RunOptions::from(settings);
    if let Some(schedule) = args.schedule {
        options.schedule = schedule;
    }
    if let Some(ms) = args.poll_interval_ms {
        options.poll_interval = Duration::from_millis(ms.max(1));
    }
    if let Some(secs) = args.readiness_timeout_secs {
        options.readiness_timeout = Duration::from_secs(secs);
    }
    options
}

/// Simple dry-run output: print levels and removed edges.
fn print_dry_run(workflow: &WorkflowDescription, plan: &ExecutionPlan) {
    println!("wfbench-runner dry-run");
    println!("  workflow = {}", workflow.name);
    println!("  tasks = {}", plan.task_count());
    println!();

    println!("levels ({}):", plan.levels.len());
    for (index, level) in plan.levels.iter().enumerate() {
        println!("  {index}: {}", level.join(", "));
    }

    if !plan.removed_edges.is_empty() {
        println!();
        println!("removed edges ({}):", plan.removed_edges.len());
        for edge in plan.removed_edges.iter() {
            println!("  {} -> {}", edge.from, edge.to);
        }
    }

    debug!("dry-run complete (no invocations)");
}
