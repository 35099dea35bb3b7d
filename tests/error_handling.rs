// tests/error_handling.rs

mod common;
use crate::common::builders::{TaskBuilder, diamond};
use crate::common::fake_worker::FakeWorker;
use crate::common::init_tracing;

use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::tempdir;

use wfbench_runner::config::{load_and_validate, load_from_path, load_settings};
use wfbench_runner::engine::RunOptions;
use wfbench_runner::errors::WfBenchError;
use wfbench_runner::exec::{InvocationTarget, Invoker, LocalTarget};
use wfbench_runner::fs::RealFileSystem;
use wfbench_runner::types::ScheduleMode;

type TestResult = Result<(), Box<dyn Error>>;

fn write(dir: &Path, name: &str, contents: &str) -> Result<std::path::PathBuf, Box<dyn Error>> {
    let path = dir.join(name);
    fs::write(&path, contents)?;
    Ok(path)
}

#[test]
fn loads_translator_mapping() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let doc = diamond("/data").to_json();
    let path = write(dir.path(), "wf.json", &serde_json::to_string(&doc)?)?;

    let workflow = load_and_validate(&path)?;

    assert_eq!(workflow.name, "diamond");
    assert_eq!(workflow.tasks.len(), 4);
    assert_eq!(workflow.task("D").map(|t| t.input_files()), Some(vec!["B.out".to_string(), "C.out".to_string()]));
    assert_eq!(workflow.result_dir("r"), Path::new("/data/r"));
    Ok(())
}

#[test]
fn loads_raw_task_list_and_ignores_unknown_fields() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let doc = json!({
        "workflow": {
            "name": "raw",
            "workflow_data_locality": "/data",
            "workflow_manager_data_locality": "/mnt/data",
            "makespanInSeconds": 12,
            "tasks": [
                {"name": "a", "id": "1", "category": "split", "children": ["b"], "files": [
                    {"name": "a.out", "link": "output", "sizeInBytes": 10}
                ], "command": {"program": "wfbench", "arguments": ["a", "--cpu-work 10"]}},
                {"name": "b", "parents": ["a"], "files": [{"name": "a.out", "link": "input"}]}
            ]
        }
    });
    let path = write(dir.path(), "raw.json", &doc.to_string())?;

    let workflow = load_and_validate(&path)?;

    assert_eq!(workflow.tasks.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(workflow.result_dir("r"), Path::new("/mnt/data/r"));
    assert_eq!(workflow.workdir("r"), Path::new("/data/r"));
    assert!(workflow.task("a").is_some_and(|t| t.has_invocation()));
    assert!(workflow.task("b").is_some_and(|t| !t.has_invocation()));
    Ok(())
}

#[test]
fn unknown_child_is_malformed() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let doc = json!({"workflow": {"name": "w", "workflow_data_locality": "/d", "tasks": {
        "a": {"children": ["ghost"]}
    }}});
    let path = write(dir.path(), "wf.json", &doc.to_string())?;

    match load_and_validate(&path) {
        Err(WfBenchError::MalformedWorkflow(msg)) => assert!(msg.contains("ghost"), "got: {msg}"),
        other => panic!("expected MalformedWorkflow, got {other:?}"),
    }
    Ok(())
}

#[test]
fn unknown_parent_is_malformed() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let doc = json!({"workflow": {"name": "w", "workflow_data_locality": "/d", "tasks": {
        "a": {"parents": ["ghost"]}
    }}});
    let path = write(dir.path(), "wf.json", &doc.to_string())?;

    let err = load_and_validate(&path).expect_err("dangling parent");
    assert!(matches!(err, WfBenchError::MalformedWorkflow(_)), "got {err:?}");
    Ok(())
}

#[test]
fn duplicate_and_nameless_list_entries_are_malformed() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let dup = json!({"workflow": {"name": "w", "workflow_data_locality": "/d", "tasks": [
        {"name": "a"}, {"name": "a"}
    ]}});
    let nameless = json!({"workflow": {"name": "w", "workflow_data_locality": "/d", "tasks": [
        {"children": []}
    ]}});

    for (file, doc) in [("dup.json", dup), ("nameless.json", nameless)] {
        let path = write(dir.path(), file, &doc.to_string())?;
        let err = load_and_validate(&path).expect_err("must be rejected");
        assert!(matches!(err, WfBenchError::MalformedWorkflow(_)), "{file}: {err:?}");
    }
    Ok(())
}

#[test]
fn empty_workflow_is_malformed() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let doc = json!({"workflow": {"name": "w", "workflow_data_locality": "/d", "tasks": {}}});
    let path = write(dir.path(), "wf.json", &doc.to_string())?;

    let err = load_and_validate(&path).expect_err("no tasks");
    assert!(matches!(err, WfBenchError::MalformedWorkflow(_)));
    Ok(())
}

#[test]
fn invalid_json_and_missing_file() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let path = write(dir.path(), "broken.json", "{\"workflow\": ")?;
    assert!(matches!(load_from_path(&path), Err(WfBenchError::JsonError(_))));

    let missing = dir.path().join("missing.json");
    assert!(matches!(load_from_path(&missing), Err(WfBenchError::IoError(_))));
    Ok(())
}

#[test]
fn settings_default_without_file() -> TestResult {
    init_tracing();

    let settings = load_settings(None)?;
    let options = RunOptions::from(&settings);

    assert_eq!(settings.local.endpoint, "http://localhost:80/wfbench");
    assert_eq!(options.poll_interval, Duration::from_secs(1));
    assert_eq!(options.readiness_timeout, Duration::from_secs(600));
    assert_eq!(options.retry.max_retries, 3);
    assert_eq!(options.schedule, ScheduleMode::Levels);
    Ok(())
}

#[test]
fn settings_file_overrides_defaults() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let path = write(
        dir.path(),
        "runner.toml",
        r#"
[driver]
poll_interval_ms = 250
schedule = "dependencies"

[retry]
max_retries = 5
initial_delay_ms = 100

[local]
endpoint = "http://worker:8080/wfbench"
"#,
    )?;

    let settings = load_settings(Some(&path))?;
    let options = RunOptions::from(&settings);

    assert_eq!(options.poll_interval, Duration::from_millis(250));
    assert_eq!(options.readiness_timeout, Duration::from_secs(600));
    assert_eq!(options.schedule, ScheduleMode::Dependencies);
    assert_eq!(options.retry.max_retries, 5);
    assert_eq!(options.retry.initial_delay, Duration::from_millis(100));
    assert_eq!(options.retry.max_delay, Duration::from_millis(8000));
    assert_eq!(settings.local.endpoint, "http://worker:8080/wfbench");
    Ok(())
}

#[test]
fn invalid_settings_are_rejected() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    let zero_poll = write(dir.path(), "a.toml", "[driver]\npoll_interval_ms = 0\n")?;
    assert!(matches!(load_settings(Some(&zero_poll)), Err(WfBenchError::ConfigError(_))));

    let bad_delay = write(
        dir.path(),
        "b.toml",
        "[retry]\ninitial_delay_ms = 9000\nmax_delay_ms = 10\n",
    )?;
    assert!(matches!(load_settings(Some(&bad_delay)), Err(WfBenchError::ConfigError(_))));

    let bad_toml = write(dir.path(), "c.toml", "[driver\n")?;
    assert!(matches!(load_settings(Some(&bad_toml)), Err(WfBenchError::TomlError(_))));
    Ok(())
}

#[tokio::test]
async fn worker_output_write_failure_keeps_its_context() -> TestResult {
    init_tracing();

    let dir = tempdir()?;
    // A plain file where the worker expects its result directory.
    let blocker = write(dir.path(), "blocker", "not a directory")?;
    let worker = FakeWorker::new(Arc::new(RealFileSystem)).result_dir(&blocker);

    let task = TaskBuilder::new().output("t.out", 1).wfbench("t").build();
    let request = LocalTarget::default().build_request("t", &task, dir.path())?;

    match worker.invoke(&request).await {
        Err(WfBenchError::Other(err)) => {
            let message = format!("{err:#}");
            assert!(message.contains("fake worker writing"), "message: {message}");
            assert!(message.contains("t.out"), "message: {message}");
        }
        other => return Err(format!("expected a write failure, got {other:?}").into()),
    }
    assert_eq!(worker.call_count("t"), 1);
    Ok(())
}
