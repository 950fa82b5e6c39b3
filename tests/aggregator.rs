// tests/aggregator.rs

mod common;
use crate::common::builders::unit;
use crate::common::fake_runner::{non_zero, pass, timed_out, validation_failure};

use std::time::Duration;

use chrono::{TimeZone, Utc};
use tempfile::TempDir;

use jepsen_matrix::exec::CmdResult;
use jepsen_matrix::report::{ReportAggregator, TestCaseRecord, TestSuiteReport};
use jepsen_matrix::types::TestStatus;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn record(workload: &str, status: TestStatus, result: &CmdResult, secs: u64) -> TestCaseRecord {
    TestCaseRecord::from_run(
        &unit(workload, "none"),
        Duration::from_secs(secs),
        status,
        result,
    )
}

#[test]
fn failure_after_pass_overwrites() {
    let mut agg = ReportAggregator::new();
    assert!(agg.record(record("ycql/counter", TestStatus::Pass, &pass(), 10)));
    assert!(agg.record(record("ycql/counter", TestStatus::NonZeroExit, &non_zero(2), 20)));

    let stored = agg.get("ycql/counter_none").unwrap();
    assert_eq!(stored.status, TestStatus::NonZeroExit);
    assert_eq!(stored.return_code, 2);
    assert_eq!(agg.len(), 1);
    assert!(!agg.all_passed());
}

#[test]
fn pass_after_failure_is_ignored() {
    let mut agg = ReportAggregator::new();
    agg.record(record("ycql/counter", TestStatus::NonZeroExit, &non_zero(2), 20));
    assert!(!agg.record(record("ycql/counter", TestStatus::Pass, &pass(), 10)));

    assert_eq!(
        agg.get("ycql/counter_none").unwrap().status,
        TestStatus::NonZeroExit
    );
}

#[test]
fn first_pass_is_kept() {
    let mut agg = ReportAggregator::new();
    agg.record(record("ycql/counter", TestStatus::Pass, &pass(), 10));
    agg.record(record("ycql/counter", TestStatus::Pass, &pass(), 99));

    assert_eq!(
        agg.get("ycql/counter_none").unwrap().elapsed,
        Duration::from_secs(10)
    );
}

#[test]
fn latest_failure_wins_among_failures() {
    let mut agg = ReportAggregator::new();
    agg.record(record("ycql/set", TestStatus::Timeout, &timed_out(), 1200));
    agg.record(record("ycql/set", TestStatus::Pass, &pass(), 300));
    agg.record(record(
        "ycql/set",
        TestStatus::ValidationFailure,
        &validation_failure(),
        310,
    ));

    let stored = agg.get("ycql/set_none").unwrap();
    assert_eq!(stored.status, TestStatus::ValidationFailure);
    assert_eq!(
        stored.failure_message().as_deref(),
        Some("Failure on result validation")
    );
}

#[test]
fn timeout_record_keeps_the_raw_supervisor_flags() {
    let mut result = timed_out();
    result.everything_looks_good = true;

    let rec = record("ysql/bank", TestStatus::Timeout, &result, 1200);

    assert_eq!(rec.status, TestStatus::Timeout);
    assert!(rec.timed_out);
    assert!(rec.everything_looks_good);

    let rec = record("ysql/bank", TestStatus::Pass, &pass(), 30);
    assert!(!rec.timed_out);
    assert!(rec.everything_looks_good);
}

#[test]
fn names_keep_first_appearance_order() {
    let mut agg = ReportAggregator::new();
    agg.record(record("ycql/set", TestStatus::Pass, &pass(), 1));
    agg.record(record("ycql/counter", TestStatus::Pass, &pass(), 1));
    agg.record(record("ycql/set", TestStatus::NonZeroExit, &non_zero(1), 1));

    let names: Vec<&str> = agg.records().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["ycql/set_none", "ycql/counter_none"]);
}

fn sample_report(records: Vec<TestCaseRecord>) -> TestSuiteReport {
    TestSuiteReport::new(
        "none,partition",
        "2.13.1.0-b112",
        "https://ci.example/job/42",
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        records,
    )
}

#[test]
fn junit_xml_carries_cases_and_failures() -> TestResult {
    let report = sample_report(vec![
        record("ycql/counter", TestStatus::Pass, &pass(), 42),
        record("ysql/sz.bank", TestStatus::NonZeroExit, &non_zero(3), 7),
        record("ycql/set", TestStatus::Timeout, &timed_out(), 1200),
    ]);

    let xml = report.to_junit_xml()?;

    assert!(xml.contains(r#"name="Jepsen none-partition 2.13.1.0-b112""#));
    assert!(xml.contains(r#"name="ycql/counter_none""#));
    assert!(xml.contains(r#"classname="ysql""#));
    assert!(xml.contains("Process exited with error code 3"));
    assert!(xml.contains("Timed out"));
    assert!(xml.contains("harness exited with 3"));
    assert!(xml.contains("https://ci.example/job/42"));
    assert_eq!(report.count(TestStatus::Pass), 1);
    assert_eq!(report.exit_code(), 1);
    Ok(())
}

#[test]
fn all_pass_report_exits_zero() {
    let report = sample_report(vec![record("ycql/counter", TestStatus::Pass, &pass(), 1)]);
    assert_eq!(report.exit_code(), 0);
    assert!(sample_report(Vec::new()).all_passed());
}

#[test]
fn report_is_written_under_nemesis_file_name() -> TestResult {
    let dir = TempDir::new()?;
    let report = sample_report(vec![record("ycql/counter", TestStatus::Pass, &pass(), 1)]);

    let path = report.write_to(&dir.path().join("reports"))?;

    assert_eq!(path.file_name().unwrap(), "jepsen-junit-none-partition.xml");
    let contents = std::fs::read_to_string(&path)?;
    assert!(contents.starts_with("<?xml"));
    Ok(())
}
