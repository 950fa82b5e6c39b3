// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// nemeses = ["none", "kill-tserver"]
///
/// [config]
/// test_command = "lein run test"
/// run_time_sec = 600
/// unit_timeout_sec = 1200
///
/// [[workloads]]
/// start_version = "1.3.1.0"
/// tests = ["ycql/counter", "ysql/sz.bank"]
/// ```
///
/// Every section is optional. A missing `workloads` list falls back to the
/// built-in YugabyteDB table, a missing `nemeses` list to the built-in
/// nemesis set.
///
/// This is the *unvalidated* shape; see [`ConfigFile`].
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default = "default_workload_groups")]
    pub workloads: Vec<WorkloadGroup>,

    #[serde(default = "default_nemeses")]
    pub nemeses: Vec<String>,
}

impl Default for RawConfigFile {
    fn default() -> Self {
        Self {
            config: ConfigSection::default(),
            workloads: default_workload_groups(),
            nemeses: default_nemeses(),
        }
    }
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`), so
/// holders can rely on the version table being well formed.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub workloads: Vec<WorkloadGroup>,
    pub nemeses: Vec<String>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        workloads: Vec<WorkloadGroup>,
        nemeses: Vec<String>,
    ) -> Self {
        Self {
            config,
            workloads,
            nemeses,
        }
    }

    /// Every workload in the version table, in table order.
    pub fn all_workloads(&self) -> Vec<String> {
        self.workloads
            .iter()
            .flat_map(|group| group.tests.iter().cloned())
            .collect()
    }

    /// Minimum artifact version a workload needs, if the workload is known.
    pub fn required_version(&self, workload: &str) -> Option<&str> {
        self.workloads
            .iter()
            .find(|group| group.tests.iter().any(|t| t == workload))
            .map(|group| group.start_version.as_str())
    }
}

/// `[config]` section: paths, harness invocation and time limits.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Harness result store; `<store_dir>/current/jepsen.log` is the engine log.
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,

    /// Where per-unit stdout/stderr capture files go.
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,

    /// Where the JUnit XML report is written.
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,

    /// Script that tidies the result store. Skipped when unset.
    #[serde(default)]
    pub sort_results_script: Option<String>,

    /// Base harness command; per-unit flags are appended to it.
    #[serde(default = "default_test_command")]
    pub test_command: String,

    #[serde(default = "default_os")]
    pub os: String,

    #[serde(default = "default_ssh_private_key")]
    pub ssh_private_key: String,

    /// Workload run time handed to the harness (excludes analysis).
    #[serde(default = "default_run_time_sec")]
    pub run_time_sec: u64,

    /// Run time for `*/set` workloads, whose analysis is much slower.
    #[serde(default = "default_set_run_time_sec")]
    pub set_run_time_sec: u64,

    /// Hard deadline for one unit, including the harness's analysis phase.
    #[serde(default = "default_unit_timeout_sec")]
    pub unit_timeout_sec: u64,

    /// Lines of captured stdout scanned for the success sentinel.
    #[serde(default = "default_tail_lines")]
    pub tail_lines: usize,

    /// Lines of each capture file echoed to the log after a unit.
    #[serde(default = "default_show_lines")]
    pub show_lines: usize,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Total grace period the shutdown sweep grants live children.
    #[serde(default = "default_cleanup_grace_sec")]
    pub cleanup_grace_sec: u64,
}

impl ConfigSection {
    pub fn unit_timeout(&self) -> Duration {
        Duration::from_secs(self.unit_timeout_sec)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn cleanup_grace(&self) -> Duration {
        Duration::from_secs(self.cleanup_grace_sec)
    }

    /// `<store_dir>/current/jepsen.log`.
    pub fn engine_log_path(&self) -> PathBuf {
        self.store_dir.join("current").join("jepsen.log")
    }
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            logs_dir: default_logs_dir(),
            report_dir: default_report_dir(),
            sort_results_script: None,
            test_command: default_test_command(),
            os: default_os(),
            ssh_private_key: default_ssh_private_key(),
            run_time_sec: default_run_time_sec(),
            set_run_time_sec: default_set_run_time_sec(),
            unit_timeout_sec: default_unit_timeout_sec(),
            tail_lines: default_tail_lines(),
            show_lines: default_show_lines(),
            poll_interval_ms: default_poll_interval_ms(),
            cleanup_grace_sec: default_cleanup_grace_sec(),
        }
    }
}

/// `[[workloads]]` entry: every test listed needs at least `start_version`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkloadGroup {
    pub start_version: String,
    #[serde(default)]
    pub tests: Vec<String>,
}

impl WorkloadGroup {
    pub fn new(start_version: &str, tests: &[&str]) -> Self {
        Self {
            start_version: start_version.to_string(),
            tests: tests.iter().map(|t| t.to_string()).collect(),
        }
    }
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("store")
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_report_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_test_command() -> String {
    "lein run test".to_string()
}

fn default_os() -> String {
    "debian".to_string()
}

fn default_ssh_private_key() -> String {
    "~/.ssh/id_rsa".to_string()
}

fn default_run_time_sec() -> u64 {
    600
}

fn default_set_run_time_sec() -> u64 {
    300
}

fn default_unit_timeout_sec() -> u64 {
    1200
}

fn default_tail_lines() -> usize {
    50
}

fn default_show_lines() -> usize {
    30
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_cleanup_grace_sec() -> u64 {
    5
}

fn default_nemeses() -> Vec<String> {
    [
        "none",
        "kill-tserver",
        "kill-master",
        "pause-tserver",
        "pause-master",
        "partition",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_workload_groups() -> Vec<WorkloadGroup> {
    vec![
        WorkloadGroup::new(
            "1.3.1.0",
            &[
                // YCQL snapshot isolation
                "ycql/counter",
                "ycql/set",
                "ycql/set-index",
                "ycql/bank",
                "ycql/long-fork",
                "ycql/single-key-acid",
                "ycql/multi-key-acid",
                // YSQL serializable
                "ysql/sz.counter",
                "ysql/sz.set",
                "ysql/sz.bank",
                "ysql/sz.bank-contention",
                "ysql/sz.bank-multitable",
                "ysql/sz.long-fork",
                "ysql/sz.single-key-acid",
                "ysql/sz.multi-key-acid",
                "ysql/sz.default-value",
                "ysql/sz.ol.append",
                "ysql/sz.ol.geo.append",
                // YSQL snapshot isolation
                "ysql/si.ol.append",
                "ysql/si.ol.geo.append",
                "ysql/si.bank",
                "ysql/si.bank-contention",
                "ysql/si.bank-multitable",
            ],
        ),
        // YSQL read committed
        WorkloadGroup::new("2.13.1.0-b1", &["ysql/rc.ol.append", "ysql/rc.ol.geo.append"]),
        WorkloadGroup::new("2.15.0.0-b1", &["ysql/rc.pl.append", "ysql/rc.pl.geo.append"]),
        WorkloadGroup::new(
            "2.17.2.0-b1",
            &[
                "ysql/sz.pl.append",
                "ysql/sz.pl.geo.append",
                "ysql/si.pl.append",
                "ysql/si.pl.geo.append",
            ],
        ),
    ]
}
