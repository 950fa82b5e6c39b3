// src/report/junit.rs

//! Suite-level report and its JUnit XML serialization.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use quick_junit::{NonSuccessKind, Property, Report, TestCase, TestCaseStatus, TestSuite};
use tracing::info;

use crate::errors::{MatrixError, Result};
use crate::report::aggregator::TestCaseRecord;
use crate::types::TestStatus;

/// Everything that goes into the JUnit file for one orchestrator run.
#[derive(Debug, Clone)]
pub struct TestSuiteReport {
    pub nemesis_set: String,
    pub version: String,
    pub build_url: String,
    pub timestamp: DateTime<Utc>,
    pub records: Vec<TestCaseRecord>,
}

impl TestSuiteReport {
    pub fn new(
        nemesis_set: impl Into<String>,
        version: impl Into<String>,
        build_url: impl Into<String>,
        timestamp: DateTime<Utc>,
        records: Vec<TestCaseRecord>,
    ) -> Self {
        Self {
            nemesis_set: nemesis_set.into(),
            version: version.into(),
            build_url: build_url.into(),
            timestamp,
            records,
        }
    }

    /// `none,partition` → `none-partition`.
    pub fn nemesis_slug(&self) -> String {
        self.nemesis_set.replace(',', "-")
    }

    /// `Jepsen <nemeses> <version>`.
    pub fn suite_name(&self) -> String {
        format!("Jepsen {} {}", self.nemesis_slug(), self.version)
    }

    /// `jepsen-junit-<nemeses>.xml`.
    pub fn file_name(&self) -> String {
        format!("jepsen-junit-{}.xml", self.nemesis_slug())
    }

    pub fn all_passed(&self) -> bool {
        self.records.iter().all(|r| r.status.is_pass())
    }

    /// `0` if every retained record passed, `1` otherwise. An empty report
    /// counts as passing.
    pub fn exit_code(&self) -> i32 {
        if self.all_passed() { 0 } else { 1 }
    }

    pub fn count(&self, status: TestStatus) -> usize {
        self.records.iter().filter(|r| r.status == status).count()
    }

    pub fn to_junit_xml(&self) -> Result<String> {
        let mut suite = TestSuite::new(self.suite_name());
        suite.add_property(Property::new("nemesis", self.nemesis_set.as_str()));
        suite.add_property(Property::new("version", self.version.as_str()));
        suite.add_property(Property::new(
            "timestamp",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        ));
        if !self.build_url.is_empty() {
            suite.add_property(Property::new("build_url", self.build_url.as_str()));
        }

        suite.add_test_cases(self.records.iter().map(junit_test_case));

        let mut report = Report::new(self.suite_name());
        report.add_test_suite(suite);
        report
            .to_string()
            .map_err(|e| MatrixError::ReportError(format!("serializing JUnit report: {e}")))
    }

    /// Serialize and write to `<dir>/<file_name()>`, returning the path.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let xml = self.to_junit_xml()?;
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
        let path = dir.join(self.file_name());
        fs::write(&path, xml)?;
        info!(path = %path.display(), records = self.records.len(), "stored JUnit XML report");
        Ok(path)
    }
}

fn junit_test_case(record: &TestCaseRecord) -> TestCase {
    let status = match record.status {
        TestStatus::Pass => TestCaseStatus::success(),
        TestStatus::Timeout | TestStatus::ValidationFailure => {
            let mut status = TestCaseStatus::non_success(NonSuccessKind::Error);
            if let Some(message) = record.failure_message() {
                status.set_message(message);
            }
            status.set_description(record.description.as_str());
            status
        }
        TestStatus::NonZeroExit => {
            let mut status = TestCaseStatus::non_success(NonSuccessKind::Failure);
            if let Some(message) = record.failure_message() {
                status.set_message(message);
            }
            status
                .set_type("exit code")
                .set_description(record.description.as_str());
            status
        }
    };

    let mut case = TestCase::new(record.name.as_str(), status);
    case.set_classname(record.group_name.as_str());
    case.set_time(record.elapsed);
    if let Some(excerpt) = &record.diagnostic_excerpt {
        case.set_system_err(excerpt.as_str());
    }
    case
}
