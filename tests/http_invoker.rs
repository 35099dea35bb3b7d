// tests/http_invoker.rs

mod common;
use crate::common::builders::{TaskBuilder, WorkflowBuilder};
use crate::common::{fast_options, init_tracing, with_timeout};

use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wfbench_runner::dag::ExecutionPlan;
use wfbench_runner::engine::{ExecutionDriver, TaskOutcome};
use wfbench_runner::errors::WfBenchError;
use wfbench_runner::exec::{HttpInvoker, InvocationTarget, Invoker, KnativeTarget, LocalTarget};
use wfbench_runner::fs::FileSystem;
use wfbench_runner::fs::mock::MockFileSystem;
use wfbench_runner::types::ScheduleMode;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn posts_json_body_to_endpoint() -> TestResult {
    init_tracing();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/wfbench"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "name": "t",
            "cpu-work": 100,
            "out": {"t.out": 7},
            "inputs": [],
            "workdir": "/data/run-1",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let task = TaskBuilder::new().output("t.out", 7).wfbench("t").build();
    let target = LocalTarget::new(format!("{}/wfbench", server.uri()));
    let request = target.build_request("t", &task, Path::new("/data/run-1"))?;

    let invoker = HttpInvoker::new(Duration::from_secs(5))?;
    let response = invoker.invoke(&request).await?;

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "ok");
    Ok(())
}

#[tokio::test]
async fn non_success_status_is_invocation_error() -> TestResult {
    init_tracing();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let task = TaskBuilder::new().wfbench("t").build();
    let request = LocalTarget::new(server.uri()).build_request("t", &task, Path::new("/d"))?;
    let invoker = HttpInvoker::new(Duration::from_secs(5))?;

    match invoker.invoke(&request).await {
        Err(WfBenchError::Invocation { task, reason }) => {
            assert_eq!(task, "t");
            assert!(reason.contains("503"), "reason: {reason}");
        }
        other => panic!("expected Invocation error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn unreachable_endpoint_is_invocation_error() -> TestResult {
    init_tracing();

    let task = TaskBuilder::new().wfbench("t").build();
    // Port 9 (discard) on localhost is not expected to accept HTTP.
    let request = LocalTarget::new("http://127.0.0.1:9/wfbench").build_request("t", &task, Path::new("/d"))?;
    let invoker = HttpInvoker::new(Duration::from_secs(2))?;

    let err = invoker.invoke(&request).await.expect_err("nothing listens there");
    assert!(matches!(err, WfBenchError::Invocation { .. }), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn knative_run_retries_then_succeeds() -> TestResult {
    init_tracing();

    let server = MockServer::start().await;
    // First call fails, every later one succeeds.
    Mock::given(method("POST"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/steady"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let workflow = WorkflowBuilder::new("knative")
        .with_task(
            "flaky",
            TaskBuilder::new()
                .api_url(&format!("{}/flaky", server.uri()))
                .output("flaky.out", 1)
                .wfbench("flaky")
                .build(),
        )
        .with_task(
            "steady",
            TaskBuilder::new()
                .api_url(&format!("{}/steady", server.uri()))
                .output("steady.out", 1)
                .wfbench("steady")
                .build(),
        )
        .build();

    let plan = ExecutionPlan::build(&workflow)?;
    let fs: Arc<dyn FileSystem> = Arc::new(MockFileSystem::new());
    let driver = ExecutionDriver::new(
        workflow,
        plan,
        Box::new(KnativeTarget),
        HttpInvoker::new(Duration::from_secs(5))?,
        fs,
        "run-1",
        1,
        fast_options(ScheduleMode::Levels),
    );

    let report = with_timeout(driver.run()).await?;

    assert_eq!(report.outcome_of("flaky"), Some(&TaskOutcome::Completed));
    assert_eq!(report.outcome_of("steady"), Some(&TaskOutcome::Completed));
    let flaky = report
        .invocations
        .iter()
        .find(|r| r.task == "flaky")
        .ok_or("no record for flaky")?;
    assert_eq!(flaky.attempts, 2);
    assert_eq!(flaky.endpoint, format!("{}/flaky", server.uri()));
    Ok(())
}
