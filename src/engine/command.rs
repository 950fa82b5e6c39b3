// src/engine/command.rs

//! Harness command line construction.

use crate::config::ConfigSection;
use crate::engine::RunSettings;
use crate::plan::TestUnit;

/// Builds the shell command for each unit from the fixed per-run flags.
#[derive(Debug, Clone)]
pub struct HarnessCommand {
    test_command: String,
    os: String,
    ssh_private_key: String,
    url: String,
    concurrency: String,
    single_test_count: bool,
    run_time_sec: u64,
    set_run_time_sec: u64,
}

impl HarnessCommand {
    pub fn new(cfg: &ConfigSection, settings: &RunSettings) -> Self {
        Self {
            test_command: cfg.test_command.clone(),
            os: cfg.os.clone(),
            ssh_private_key: cfg.ssh_private_key.clone(),
            url: settings.url.clone(),
            concurrency: settings.concurrency.to_string(),
            single_test_count: settings.iterations.is_some(),
            run_time_sec: cfg.run_time_sec,
            set_run_time_sec: cfg.set_run_time_sec,
        }
    }

    /// Workload run time passed as `--time-limit`.
    ///
    /// `*/set` workloads get the shorter limit: their analysis phase is slow
    /// enough to blow the unit deadline otherwise.
    pub fn time_limit_sec(&self, unit: &TestUnit) -> u64 {
        if unit.is_set_workload() {
            self.set_run_time_sec
        } else {
            self.run_time_sec
        }
    }

    pub fn for_unit(&self, unit: &TestUnit) -> String {
        let mut parts = vec![
            self.test_command.clone(),
            format!("--os {}", self.os),
            format!("--url {}", self.url),
            format!("--nemesis {}", unit.nemesis_set),
            format!("--ssh-private-key {}", self.ssh_private_key),
            format!("--concurrency {}", self.concurrency),
        ];
        if self.single_test_count {
            parts.push("--test-count 1".to_string());
        }
        parts.push(format!("--time-limit {}", self.time_limit_sec(unit)));
        parts.push(format!("--workload {}", unit.workload));
        parts.join(" ")
    }
}

/// Capture file prefix: `<workload with / as ->_nemesis_<nemeses>_<run>`.
pub fn capture_prefix(unit: &TestUnit, run_index: usize) -> String {
    format!(
        "{}_nemesis_{}_{}",
        unit.workload.replace('/', "-"),
        unit.nemesis_set,
        run_index
    )
}
