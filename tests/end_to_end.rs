// tests/end_to_end.rs

mod common;
use crate::common::builders::{settings, ConfigFileBuilder};
use crate::common::{init_tracing, with_timeout, write_script};

use std::fs;
use std::path::Path;
use std::time::Duration;

use clap::Parser;
use tempfile::TempDir;

use jepsen_matrix::cli::CliArgs;
use jepsen_matrix::config::ConfigFile;
use jepsen_matrix::engine::RunLoop;
use jepsen_matrix::exec::{ProcessRegistry, ProcessSupervisor};
use jepsen_matrix::plan::{plan_matrix, Version};
use jepsen_matrix::types::TestStatus;

type TestResult = Result<(), Box<dyn std::error::Error>>;

/// A stand-in harness: `*/good` workloads validate, anything else fails.
const FAKE_HARNESS: &str = r#"
workload=""
while [ $# -gt 0 ]; do
  case "$1" in
    --workload) workload="$2"; shift 2 ;;
    *) shift ;;
  esac
done
echo "running $workload"
case "$workload" in
  */good) echo 'Everything looks good! ヽ(‘ー`)ノ'; exit 0 ;;
  */slow) sleep 30 ;;
  *) echo 'Analysis invalid! (ﾉಥ益ಥ）ﾉ ┻━┻' >&2; exit 1 ;;
esac
"#;

fn harness_config(root: &Path) -> ConfigFile {
    let script = write_script(root, "harness.sh", FAKE_HARNESS);
    ConfigFileBuilder::new()
        .with_root(root)
        .with_group("1.3.1.0", &["demo/good", "demo/bad"])
        .with_group("2.13.1.0-b1", &["demo/slow"])
        .with_test_command(&format!("sh {}", script.display()))
        .with_run_times(1, 1)
        .with_unit_timeout_sec(2)
        .with_poll_interval_ms(20)
        .build()
}

#[tokio::test]
async fn real_processes_are_classified_and_reported() -> TestResult {
    init_tracing();
    let root = TempDir::new()?;
    let cfg = harness_config(root.path());
    let actual: Version = "2.13.1.0-b112".parse()?;
    let workloads = vec![
        "demo/good".to_string(),
        "demo/bad".to_string(),
        "demo/slow".to_string(),
    ];
    let plan = plan_matrix(&cfg, &workloads, "none", 1, &actual)?;

    let registry = ProcessRegistry::new();
    let supervisor = ProcessSupervisor::new(registry.clone())
        .with_poll_interval(cfg.config.poll_interval());
    let logs_dir = cfg.config.logs_dir.clone();

    let mut run_loop = RunLoop::new(cfg, settings(), supervisor);
    run_loop.prepare().await?;
    let summary = with_timeout(Duration::from_secs(30), run_loop.run(&plan)).await?;

    let statuses: Vec<(&str, TestStatus)> = summary
        .report
        .records
        .iter()
        .map(|r| (r.name.as_str(), r.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("demo/good_none", TestStatus::Pass),
            ("demo/bad_none", TestStatus::NonZeroExit),
            ("demo/slow_none", TestStatus::Timeout),
        ]
    );
    assert_eq!(summary.exit_code(), 1);
    assert!(registry.is_empty());

    // Passing captures are removed, failing ones stay for inspection.
    assert!(!logs_dir.join("demo-good_nemesis_none_1_stdout.log").exists());
    let bad_stderr = fs::read_to_string(logs_dir.join("demo-bad_nemesis_none_2_stderr.log"))?;
    assert!(bad_stderr.contains("Analysis invalid!"));

    let bad = &summary.report.records[1];
    assert_eq!(bad.return_code, 1);
    assert_eq!(bad.diagnostic_excerpt.as_deref(), Some("running demo/bad"));
    Ok(())
}

#[tokio::test]
async fn cli_entry_point_runs_the_matrix() -> TestResult {
    init_tracing();
    let root = TempDir::new()?;
    let script = write_script(root.path(), "harness.sh", FAKE_HARNESS);
    let config_path = root.path().join("jepsen-matrix.toml");
    fs::write(
        &config_path,
        format!(
            r#"
nemeses = ["none"]

[config]
store_dir = "{root}/store"
logs_dir = "{root}/logs"
report_dir = "{root}/reports"
test_command = "sh {script}"
run_time_sec = 1
set_run_time_sec = 1
unit_timeout_sec = 5
poll_interval_ms = 20
cleanup_grace_sec = 1

[[workloads]]
start_version = "1.3.1.0"
tests = ["demo/good", "demo/bad"]

[[workloads]]
start_version = "9.0.0.0"
tests = ["demo/future"]
"#,
            root = root.path().display(),
            script = script.display(),
        ),
    )?;

    let args = CliArgs::parse_from([
        "jepsen-matrix",
        "--config",
        config_path.to_str().unwrap(),
        "--url",
        "https://downloads.yugabyte.com/yugabyte-2.13.1.0-b112-linux.tar.gz",
        "--workloads",
        "demo/good,demo/future",
        "--iterations",
        "2",
    ]);

    let code = with_timeout(Duration::from_secs(30), jepsen_matrix::run(args)).await?;

    assert_eq!(code, 0);
    let xml = fs::read_to_string(root.path().join("reports").join("jepsen-junit-none.xml"))?;
    assert!(xml.contains("demo/good_none"));
    assert!(!xml.contains("demo/future"));
    Ok(())
}

#[tokio::test]
async fn dry_run_executes_nothing() -> TestResult {
    let root = TempDir::new()?;
    let marker = root.path().join("ran");
    let script = write_script(root.path(), "harness.sh", &format!("touch {}", marker.display()));
    let config_path = root.path().join("jepsen-matrix.toml");
    fs::write(
        &config_path,
        format!(
            r#"
[config]
test_command = "sh {script}"
logs_dir = "{root}/logs"

[[workloads]]
start_version = "1.3.1.0"
tests = ["demo/good"]
"#,
            root = root.path().display(),
            script = script.display(),
        ),
    )?;

    let args = CliArgs::parse_from([
        "jepsen-matrix",
        "--config",
        config_path.to_str().unwrap(),
        "--dry-run",
    ]);

    assert_eq!(jepsen_matrix::run(args).await?, 0);
    assert!(!marker.exists());
    assert!(!root.path().join("logs").exists());
    Ok(())
}
