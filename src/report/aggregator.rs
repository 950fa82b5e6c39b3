// src/report/aggregator.rs

//! Folding per-run outcomes into one record per test name.
//!
//! Reconciliation rule:
//! - the first `Pass` seen for a name is stored, and a later `Pass` never
//!   replaces what is stored;
//! - any non-`Pass` outcome always overwrites the stored record, including
//!   a stored `Pass`.
//!
//! The net effect is that a name reports its most recent failure if it ever
//! failed, and its first pass otherwise.

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use crate::exec::CmdResult;
use crate::plan::TestUnit;
use crate::types::TestStatus;

/// Report entry for one test name.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCaseRecord {
    /// `{workload}_{nemesis_set}`.
    pub name: String,
    /// Workload family (`ycql`, `ysql`, ...).
    pub group_name: String,
    pub elapsed: Duration,
    pub status: TestStatus,
    pub return_code: i32,
    /// Raw supervisor flags. A `Timeout` record may still have seen the
    /// sentinel.
    pub timed_out: bool,
    pub everything_looks_good: bool,
    /// `workload W, nemesis N`.
    pub description: String,
    /// Tail of captured stdout for non-passing runs.
    pub diagnostic_excerpt: Option<String>,
}

impl TestCaseRecord {
    pub fn from_run(
        unit: &TestUnit,
        elapsed: Duration,
        status: TestStatus,
        result: &CmdResult,
    ) -> Self {
        Self {
            name: unit.test_name(),
            group_name: unit.group_name().to_string(),
            elapsed,
            status,
            return_code: result.return_code,
            timed_out: result.timed_out,
            everything_looks_good: result.everything_looks_good,
            description: unit.description(),
            diagnostic_excerpt: result.output_excerpt(),
        }
    }

    /// Human-readable reason for a non-passing record.
    pub fn failure_message(&self) -> Option<String> {
        match self.status {
            TestStatus::Pass => None,
            TestStatus::Timeout => Some("Timed out".to_string()),
            TestStatus::ValidationFailure => Some("Failure on result validation".to_string()),
            TestStatus::NonZeroExit => Some(format!(
                "Process exited with error code {}",
                self.return_code
            )),
        }
    }
}

/// Ordered map of test name to its surviving record.
///
/// Names keep the position of their first appearance.
#[derive(Debug, Default)]
pub struct ReportAggregator {
    records: Vec<TestCaseRecord>,
    index: HashMap<String, usize>,
}

impl ReportAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the reconciliation rule for `record`. Returns `true` if the
    /// stored record changed.
    pub fn record(&mut self, record: TestCaseRecord) -> bool {
        match self.index.get(&record.name) {
            None => {
                self.index.insert(record.name.clone(), self.records.len());
                self.records.push(record);
                true
            }
            Some(_) if record.status.is_pass() => {
                debug!(test = %record.name, "already recorded; keeping stored result");
                false
            }
            Some(&slot) => {
                debug!(
                    test = %record.name,
                    previous = %self.records[slot].status,
                    status = %record.status,
                    "failure overwrites stored result"
                );
                self.records[slot] = record;
                true
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&TestCaseRecord> {
        self.index.get(name).map(|&slot| &self.records[slot])
    }

    pub fn records(&self) -> &[TestCaseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn all_passed(&self) -> bool {
        self.records.iter().all(|r| r.status.is_pass())
    }

    pub fn into_records(self) -> Vec<TestCaseRecord> {
        self.records
    }
}
