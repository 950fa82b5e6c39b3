// src/engine/mod.rs

//! Orchestration engine.
//!
//! - [`budget`]: the global wall-clock budget checked between units.
//! - [`classify`]: `CmdResult` to `TestStatus`.
//! - [`tally`]: running counters.
//! - [`command`]: harness command line construction.
//! - [`core`]: pure per-unit bookkeeping (classification, aggregation).
//! - [`runtime`]: the async loop that drives a `CommandRunner` over the
//!   planned matrix.

use std::path::PathBuf;
use std::time::Duration;

use crate::report::TestSuiteReport;
use crate::types::Concurrency;

pub mod budget;
pub mod classify;
pub mod command;
pub mod core;
pub mod runtime;
pub mod tally;

pub use budget::RunBudget;
pub use classify::classify;
pub use command::{capture_prefix, HarnessCommand};
pub use self::core::RunCore;
pub use runtime::RunLoop;
pub use tally::RunTally;

/// Per-invocation settings that come from the command line rather than the
/// config file.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Artifact tarball URL handed to the harness.
    pub url: String,
    pub concurrency: Concurrency,
    /// `Some(n)` when `--iterations` was given; the harness then runs one
    /// test per invocation.
    pub iterations: Option<u32>,
    /// CI job link attached to the report.
    pub build_url: String,
    pub max_duration: Option<Duration>,
}

/// What a finished run loop hands back.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub report: TestSuiteReport,
    pub report_path: PathBuf,
    pub tally: RunTally,
    /// The budget ran out before every unit was executed.
    pub stopped_early: bool,
}

impl RunSummary {
    pub fn exit_code(&self) -> i32 {
        self.report.exit_code()
    }
}
