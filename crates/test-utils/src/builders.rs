#![allow(dead_code)]

use std::path::Path;

use jepsen_matrix::config::{ConfigFile, ConfigSection, RawConfigFile, WorkloadGroup};
use jepsen_matrix::engine::RunSettings;
use jepsen_matrix::plan::TestUnit;
use jepsen_matrix::types::Concurrency;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts with an empty version table so tests only see the workloads they
/// add.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                workloads: Vec::new(),
                nemeses: vec!["none".to_string()],
            },
        }
    }

    pub fn with_group(mut self, start_version: &str, tests: &[&str]) -> Self {
        self.config
            .workloads
            .push(WorkloadGroup::new(start_version, tests));
        self
    }

    pub fn with_nemeses(mut self, nemeses: &[&str]) -> Self {
        self.config.nemeses = nemeses.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Point every directory the run loop touches at `root`.
    pub fn with_root(mut self, root: &Path) -> Self {
        self.config.config.store_dir = root.join("store");
        self.config.config.logs_dir = root.join("logs");
        self.config.config.report_dir = root.join("reports");
        self
    }

    pub fn with_test_command(mut self, cmd: &str) -> Self {
        self.config.config.test_command = cmd.to_string();
        self
    }

    pub fn with_sort_results_script(mut self, script: &str) -> Self {
        self.config.config.sort_results_script = Some(script.to_string());
        self
    }

    pub fn with_unit_timeout_sec(mut self, secs: u64) -> Self {
        self.config.config.unit_timeout_sec = secs;
        self
    }

    pub fn with_run_times(mut self, run_time_sec: u64, set_run_time_sec: u64) -> Self {
        self.config.config.run_time_sec = run_time_sec;
        self.config.config.set_run_time_sec = set_run_time_sec;
        self
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.config.poll_interval_ms = ms;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Run settings with harmless defaults.
pub fn settings() -> RunSettings {
    RunSettings {
        url: "https://downloads.yugabyte.com/yugabyte-2.13.1.0-b112-linux.tar.gz".to_string(),
        concurrency: Concurrency::default(),
        iterations: None,
        build_url: "https://ci.example/job/42".to_string(),
        max_duration: None,
    }
}

pub fn unit(workload: &str, nemesis_set: &str) -> TestUnit {
    TestUnit {
        workload: workload.to_string(),
        nemesis_set: nemesis_set.to_string(),
        iteration_index: 0,
        required_version: "1.3.1.0".to_string(),
    }
}
