// tests/run_loop.rs

mod common;
use crate::common::builders::{settings, ConfigFileBuilder};
use crate::common::fake_runner::{non_zero, pass, timed_out, validation_failure, FakeRunner};
use crate::common::init_tracing;

use std::fs;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tempfile::TempDir;

use jepsen_matrix::config::ConfigFile;
use jepsen_matrix::engine::runtime::TIMEOUT_MARKER;
use jepsen_matrix::engine::{RunLoop, RunSettings};
use jepsen_matrix::errors::{MatrixError, Result};
use jepsen_matrix::exec::{CmdResult, CommandRunner, ExecRequest};
use jepsen_matrix::plan::{plan_matrix, MatrixPlan, Version};
use jepsen_matrix::types::TestStatus;

type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

fn config(root: &TempDir) -> ConfigFile {
    ConfigFileBuilder::new()
        .with_root(root.path())
        .with_group("1.3.1.0", &["ycql/counter", "ycql/set", "ysql/sz.bank"])
        .build()
}

fn plan(cfg: &ConfigFile, workloads: &[&str], iterations: u32) -> MatrixPlan {
    let workloads: Vec<String> = workloads.iter().map(|w| w.to_string()).collect();
    let actual: Version = "2.13.1.0-b112".parse().unwrap();
    plan_matrix(cfg, &workloads, "none", iterations, &actual).unwrap()
}

fn commands(runner: &FakeRunner) -> Vec<String> {
    runner
        .executed()
        .lock()
        .unwrap()
        .iter()
        .map(|r| r.command.clone())
        .collect()
}

#[tokio::test]
async fn zero_budget_runs_nothing_and_exits_zero() -> TestResult {
    init_tracing();
    let root = TempDir::new()?;
    let cfg = config(&root);
    let plan = plan(&cfg, &["ycql/counter", "ycql/set"], 1);
    let run_settings = RunSettings {
        max_duration: Some(Duration::ZERO),
        ..settings()
    };

    let mut run_loop = RunLoop::new(cfg, run_settings, FakeRunner::new(pass()));
    let summary = run_loop.run(&plan).await?;

    assert!(commands(run_loop.runner()).is_empty());
    assert!(summary.stopped_early);
    assert!(summary.report.records.is_empty());
    assert_eq!(summary.exit_code(), 0);
    assert!(summary.report_path.exists());
    Ok(())
}

#[tokio::test]
async fn units_run_in_plan_order_with_harness_flags() -> TestResult {
    init_tracing();
    let root = TempDir::new()?;
    let cfg = config(&root);
    let plan = plan(&cfg, &["ysql/sz.bank", "ycql/set"], 1);

    let mut run_loop = RunLoop::new(cfg, settings(), FakeRunner::new(pass()));
    let summary = run_loop.run(&plan).await?;

    let executed = run_loop.runner().executed();
    let executed = executed.lock().unwrap();
    assert_eq!(executed.len(), 2);

    let first = &executed[0];
    assert!(first.command.starts_with("lein run test --os debian --url https://"));
    assert!(first.command.contains("--nemesis none"));
    assert!(first.command.contains("--concurrency 4n"));
    assert!(first.command.contains("--time-limit 600"));
    assert!(first.command.ends_with("--workload ysql/sz.bank"));
    assert!(!first.command.contains("--test-count"));
    assert_eq!(first.timeout, Some(Duration::from_secs(1200)));
    let capture = first.capture.as_ref().unwrap();
    assert_eq!(
        capture.stdout,
        root.path().join("logs").join("ysql-sz.bank_nemesis_none_1_stdout.log")
    );

    let second = &executed[1];
    assert!(second.command.contains("--time-limit 300"));
    assert!(second.command.ends_with("--workload ycql/set"));

    assert_eq!(summary.exit_code(), 0);
    assert_eq!(summary.tally.runs, 2);
    assert_eq!(summary.tally.passed, 2);
    Ok(())
}

#[tokio::test]
async fn timeout_appends_marker_to_engine_log() -> TestResult {
    init_tracing();
    let root = TempDir::new()?;
    let cfg = config(&root);
    let engine_log = cfg.config.engine_log_path();
    fs::create_dir_all(engine_log.parent().unwrap())?;
    fs::write(&engine_log, "INFO jepsen.core - running\n")?;
    let plan = plan(&cfg, &["ycql/counter"], 1);

    let mut run_loop = RunLoop::new(cfg, settings(), FakeRunner::new(timed_out()));
    let summary = run_loop.run(&plan).await?;

    let contents = fs::read_to_string(&engine_log)?;
    assert!(contents.ends_with(TIMEOUT_MARKER));
    assert_eq!(summary.tally.timed_out, 1);
    assert_eq!(summary.report.records[0].status, TestStatus::Timeout);
    assert_eq!(summary.exit_code(), 1);
    Ok(())
}

#[tokio::test]
async fn timeout_without_engine_log_is_not_an_error() -> TestResult {
    let root = TempDir::new()?;
    let cfg = config(&root);
    let plan = plan(&cfg, &["ycql/counter"], 1);

    let mut run_loop = RunLoop::new(cfg, settings(), FakeRunner::new(timed_out()));
    let summary = run_loop.run(&plan).await?;

    assert_eq!(summary.report.count(TestStatus::Timeout), 1);
    Ok(())
}

#[tokio::test]
async fn tally_counts_every_outcome() -> TestResult {
    init_tracing();
    let root = TempDir::new()?;
    let cfg = config(&root);
    let plan = plan(&cfg, &["ycql/counter", "ycql/set", "ysql/sz.bank"], 1);
    let runner = FakeRunner::new(pass())
        .on("--workload ycql/set", validation_failure())
        .on("--workload ysql/sz.bank", non_zero(2));

    let mut run_loop = RunLoop::new(cfg, settings(), runner);
    let summary = run_loop.run(&plan).await?;

    let tally = &summary.tally;
    assert_eq!(tally.runs, 3);
    assert_eq!(tally.passed, 1);
    assert_eq!(tally.problems, 2);
    assert_eq!(tally.zero_exit, 2);
    assert_eq!(tally.non_zero_exit, 1);
    assert_eq!(
        tally.not_good,
        vec!["workload ycql/set, nemesis none", "workload ysql/sz.bank, nemesis none"]
    );

    let statuses: Vec<TestStatus> = summary.report.records.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![TestStatus::Pass, TestStatus::ValidationFailure, TestStatus::NonZeroExit]
    );
    Ok(())
}

#[tokio::test]
async fn failure_sticks_across_iterations() -> TestResult {
    init_tracing();
    let root = TempDir::new()?;
    let cfg = config(&root);
    let plan = plan(&cfg, &["ycql/counter"], 3);
    let runner = FakeRunner::new(pass())
        .on("--workload ycql/counter", pass())
        .on("--workload ycql/counter", non_zero(1))
        .on("--workload ycql/counter", pass());

    let mut run_loop = RunLoop::new(cfg, settings(), runner);
    let summary = run_loop.run(&plan).await?;

    let cmds = commands(run_loop.runner());
    assert_eq!(cmds.len(), 3);
    assert_eq!(summary.tally.runs, 3);
    assert_eq!(summary.report.records.len(), 1);
    assert_eq!(summary.report.records[0].status, TestStatus::NonZeroExit);
    assert_eq!(summary.exit_code(), 1);
    Ok(())
}

#[tokio::test]
async fn iterations_request_one_test_per_invocation() -> TestResult {
    let root = TempDir::new()?;
    let cfg = config(&root);
    let plan = plan(&cfg, &["ycql/counter"], 2);
    let run_settings = RunSettings {
        iterations: Some(2),
        ..settings()
    };

    let mut run_loop = RunLoop::new(cfg, run_settings, FakeRunner::new(pass()));
    run_loop.run(&plan).await?;

    let cmds = commands(run_loop.runner());
    assert_eq!(cmds.len(), 2);
    assert!(cmds.iter().all(|c| c.contains("--test-count 1")));
    Ok(())
}

#[tokio::test]
async fn sort_script_runs_before_and_after_every_unit() -> TestResult {
    init_tracing();
    let root = TempDir::new()?;
    let cfg = ConfigFileBuilder::new()
        .with_root(root.path())
        .with_group("1.3.1.0", &["ycql/counter", "ycql/set"])
        .with_sort_results_script("./sort-results.sh")
        .build();
    let plan = plan(&cfg, &["ycql/counter", "ycql/set"], 1);
    // A failing sort between units must not stop the run.
    let runner = FakeRunner::new(pass()).on("sort-results.sh none", non_zero(1));

    let mut run_loop = RunLoop::new(cfg, settings(), runner);
    run_loop.prepare().await?;
    let summary = run_loop.run(&plan).await?;

    let cmds = commands(run_loop.runner());
    assert_eq!(cmds.len(), 5);
    assert_eq!(cmds[0], "./sort-results.sh");
    assert!(cmds[1].ends_with("--workload ycql/counter"));
    assert_eq!(cmds[2], "./sort-results.sh none");
    assert!(cmds[3].ends_with("--workload ycql/set"));
    assert_eq!(cmds[4], "./sort-results.sh none");

    let executed = run_loop.runner().executed();
    assert!(executed.lock().unwrap()[0].abort_on_non_zero);
    assert!(!executed.lock().unwrap()[2].abort_on_non_zero);

    assert!(root.path().join("logs").is_dir());
    assert_eq!(summary.exit_code(), 0);
    Ok(())
}

#[tokio::test]
async fn failing_initial_sort_is_fatal() -> TestResult {
    let root = TempDir::new()?;
    let cfg = ConfigFileBuilder::new()
        .with_root(root.path())
        .with_group("1.3.1.0", &["ycql/counter"])
        .with_sort_results_script("./sort-results.sh")
        .build();

    let mut run_loop = RunLoop::new(cfg, settings(), FailingSetupRunner);
    let err = run_loop.prepare().await.unwrap_err();

    assert!(matches!(err, MatrixError::FatalSetupFailure { code: 3, .. }));
    Ok(())
}

#[tokio::test]
async fn report_is_written_to_report_dir() -> TestResult {
    let root = TempDir::new()?;
    let cfg = config(&root);
    let plan = plan(&cfg, &["ycql/counter"], 1);

    let mut run_loop = RunLoop::new(cfg, settings(), FakeRunner::new(non_zero(1)));
    let summary = run_loop.run(&plan).await?;

    assert_eq!(
        summary.report_path,
        root.path().join("reports").join("jepsen-junit-none.xml")
    );
    let xml = fs::read_to_string(&summary.report_path)?;
    assert!(xml.contains("Process exited with error code 1"));
    assert!(xml.contains("2.13.1.0-b112"));
    Ok(())
}

/// Runner whose every command fails the way an aborting setup step does.
struct FailingSetupRunner;

impl CommandRunner for FailingSetupRunner {
    fn run(
        &mut self,
        request: ExecRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CmdResult>> + Send + '_>> {
        Box::pin(async move {
            Err(MatrixError::FatalSetupFailure {
                command: request.command,
                code: 3,
            })
        })
    }
}
