// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::ConfigFile;
use crate::report::ReportPortalConfig;
use crate::types::Concurrency;

pub const DEFAULT_TARBALL_URL: &str =
    "https://downloads.yugabyte.com/yugabyte-1.3.1.0-linux.tar.gz";

/// Nemesis added by `--enable-clock-skew`.
pub const CLOCK_SKEW_NEMESIS: &str = "clock-skew";

/// Command-line arguments for `jepsen-matrix`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "jepsen-matrix",
    version,
    about = "Run Jepsen workloads against a database build in a loop and collect the results.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to a config file (TOML). Built-in defaults are used without one.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Database tarball URL to test. The version is parsed from it.
    #[arg(long, value_name = "URL", default_value = DEFAULT_TARBALL_URL)]
    pub url: String,

    /// Stop scheduling new runs after this many seconds. The actual run time
    /// can be one unit longer.
    #[arg(long, value_name = "SECS")]
    pub max_time_sec: Option<u64>,

    /// Comma-separated workloads. Default: every workload in the version table.
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub workloads: Option<Vec<String>>,

    /// Comma-separated nemeses. Default: the configured nemesis list.
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub nemeses: Option<Vec<String>>,

    /// Enable the clock skew nemesis. This will not work on LXC.
    #[arg(long)]
    pub enable_clock_skew: bool,

    /// Concurrency, e.g. 2n, 4n or 5n where n is the number of nodes.
    #[arg(long, value_name = "N", default_value = "4n")]
    pub concurrency: Concurrency,

    /// Run each workload repeatedly for this many iterations.
    #[arg(long, value_name = "N")]
    pub iterations: Option<u32>,

    /// CI build URL attached to the report.
    #[arg(long, value_name = "URL", default_value = "")]
    pub build_url: String,

    /// ReportPortal base URL.
    #[arg(long, value_name = "URL")]
    pub reportportal_base_url: Option<String>,

    /// ReportPortal project name.
    #[arg(long, value_name = "NAME")]
    pub reportportal_project_name: Option<String>,

    /// ReportPortal API token.
    #[arg(long, value_name = "TOKEN", env = "REPORTPORTAL_API_TOKEN", hide_env_values = true)]
    pub reportportal_api_token: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `JEPSEN_MATRIX_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Plan the matrix and print it, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// Comma-joined nemesis set handed to the harness as one value.
    pub fn nemesis_set(&self, cfg: &ConfigFile) -> String {
        let mut nemeses: Vec<String> = self
            .nemeses
            .clone()
            .unwrap_or_else(|| cfg.nemeses.clone())
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        if self.enable_clock_skew && !nemeses.iter().any(|n| n == CLOCK_SKEW_NEMESIS) {
            nemeses.push(CLOCK_SKEW_NEMESIS.to_string());
        }
        nemeses.join(",")
    }

    pub fn workload_list(&self, cfg: &ConfigFile) -> Vec<String> {
        match &self.workloads {
            Some(list) => list
                .iter()
                .map(|w| w.trim().to_string())
                .filter(|w| !w.is_empty())
                .collect(),
            None => cfg.all_workloads(),
        }
    }

    pub fn max_duration(&self) -> Option<Duration> {
        self.max_time_sec.map(Duration::from_secs)
    }

    pub fn report_portal(&self) -> Option<ReportPortalConfig> {
        ReportPortalConfig::from_parts(
            self.reportportal_base_url.as_deref(),
            self.reportportal_project_name.as_deref(),
            self.reportportal_api_token.as_deref(),
        )
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
