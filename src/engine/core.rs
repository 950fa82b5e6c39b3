// src/engine/core.rs

//! Pure bookkeeping for the run loop.
//!
//! `RunCore` turns a resolved unit into a status, updates the aggregator
//! and the running tally, and finally builds the suite report. It does no
//! IO and has no Tokio types, so it can be unit tested directly.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::engine::classify::classify;
use crate::engine::tally::RunTally;
use crate::exec::CmdResult;
use crate::plan::TestUnit;
use crate::report::{ReportAggregator, TestCaseRecord, TestSuiteReport};
use crate::types::TestStatus;

#[derive(Debug, Default)]
pub struct RunCore {
    aggregator: ReportAggregator,
    tally: RunTally,
}

impl RunCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tally(&self) -> &RunTally {
        &self.tally
    }

    pub fn aggregator(&self) -> &ReportAggregator {
        &self.aggregator
    }

    /// Classify one resolved unit and fold it into the report and tally.
    pub fn record(&mut self, unit: &TestUnit, elapsed: Duration, result: &CmdResult) -> TestStatus {
        let status = classify(result);
        let description = unit.description();

        info!(
            run = self.tally.runs + 1,
            elapsed_sec = elapsed.as_secs_f64(),
            return_code = result.return_code,
            everything_looks_good = result.everything_looks_good,
            timed_out = result.timed_out,
            %status,
            "test run finished"
        );

        self.tally
            .observe(&description, status, result.return_code, elapsed);
        self.aggregator
            .record(TestCaseRecord::from_run(unit, elapsed, status, result));

        status
    }

    /// Snapshot the surviving records into a suite report.
    pub fn build_report(
        &self,
        nemesis_set: &str,
        version: &str,
        build_url: &str,
        timestamp: DateTime<Utc>,
    ) -> TestSuiteReport {
        TestSuiteReport::new(
            nemesis_set,
            version,
            build_url,
            timestamp,
            self.aggregator.records().to_vec(),
        )
    }
}
