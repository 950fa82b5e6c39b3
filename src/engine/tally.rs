// src/engine/tally.rs

use std::time::Duration;

use tracing::info;

use crate::types::TestStatus;

/// Running counters for the summary line printed after every unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunTally {
    pub runs: usize,
    pub passed: usize,
    pub problems: usize,
    pub timed_out: usize,
    pub zero_exit: usize,
    pub non_zero_exit: usize,
    pub total_test_time: Duration,
    /// Descriptions of every unit run that did not pass, in run order.
    pub not_good: Vec<String>,
}

impl RunTally {
    pub fn observe(
        &mut self,
        description: &str,
        status: TestStatus,
        return_code: i32,
        elapsed: Duration,
    ) {
        self.runs += 1;
        self.total_test_time += elapsed;

        if status.is_pass() {
            self.passed += 1;
        } else {
            self.problems += 1;
            self.not_good.push(description.to_string());
        }
        if status == TestStatus::Timeout {
            self.timed_out += 1;
        }
        if return_code == 0 {
            self.zero_exit += 1;
        } else {
            self.non_zero_exit += 1;
        }
    }

    pub fn average_test_time(&self) -> Duration {
        if self.runs == 0 {
            Duration::ZERO
        } else {
            self.total_test_time / self.runs as u32
        }
    }

    pub fn log_summary(&self, total_elapsed: Duration) {
        info!("Finished running {} tests.", self.runs);
        info!(
            "    {} okay, {} problems ({} timed-out)",
            self.passed, self.problems, self.timed_out
        );
        info!(
            "    {} tests (out of {} total) returned non-zero exit code",
            self.non_zero_exit, self.runs
        );
        info!(
            "Elapsed time: {:.1} sec, test time: {:.1} sec, avg test time: {:.1} sec",
            total_elapsed.as_secs_f64(),
            self.total_test_time.as_secs_f64(),
            self.average_test_time().as_secs_f64()
        );
        if !self.not_good.is_empty() {
            info!(
                "Tests where something does not look good:\n    {}",
                self.not_good.join("\n    ")
            );
        }
    }
}
