// src/engine/runtime.rs

//! The run loop: executes the planned matrix strictly in order, one unit
//! fully resolved and recorded before the next starts.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::config::ConfigFile;
use crate::engine::command::{capture_prefix, HarnessCommand};
use crate::engine::core::RunCore;
use crate::engine::{RunBudget, RunSettings, RunSummary};
use crate::errors::Result;
use crate::exec::{CommandRunner, ExecRequest};
use crate::plan::MatrixPlan;
use crate::report::{ReportPortalClient, TestSuiteReport};

/// Marker appended to the harness log when a unit is killed on timeout.
pub const TIMEOUT_MARKER: &str = "Test run timed out!";

const BANNER_WIDTH: usize = 80;

/// Drives a [`CommandRunner`] over a [`MatrixPlan`].
pub struct RunLoop<R: CommandRunner> {
    cfg: ConfigFile,
    settings: RunSettings,
    runner: R,
    core: RunCore,
    publisher: Option<ReportPortalClient>,
}

impl<R: CommandRunner> std::fmt::Debug for RunLoop<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunLoop")
            .field("settings", &self.settings)
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<R: CommandRunner> RunLoop<R> {
    pub fn new(cfg: ConfigFile, settings: RunSettings, runner: R) -> Self {
        Self {
            cfg,
            settings,
            runner,
            core: RunCore::new(),
            publisher: None,
        }
    }

    pub fn with_publisher(mut self, publisher: Option<ReportPortalClient>) -> Self {
        self.publisher = publisher;
        self
    }

    pub fn core(&self) -> &RunCore {
        &self.core
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// One-off setup before the first unit.
    ///
    /// Results left behind by an interrupted previous run are sorted first;
    /// a failure there is fatal. Then the capture directory is created.
    pub async fn prepare(&mut self) -> Result<()> {
        if let Some(script) = self.cfg.config.sort_results_script.clone() {
            self.runner
                .run(ExecRequest::new(script).abort_on_non_zero(true))
                .await?;
        }

        let logs_dir = &self.cfg.config.logs_dir;
        if logs_dir.is_dir() {
            info!(dir = %logs_dir.display(), "logs directory already exists");
        } else {
            info!(dir = %logs_dir.display(), "creating logs directory");
            fs::create_dir_all(logs_dir)?;
        }
        Ok(())
    }

    /// Execute every unit of `plan` (budget permitting), then write and
    /// optionally publish the report.
    pub async fn run(&mut self, plan: &MatrixPlan) -> Result<RunSummary> {
        let budget = RunBudget::start(self.settings.max_duration);
        let harness = HarnessCommand::new(&self.cfg.config, &self.settings);
        let mut stopped_early = false;

        for unit in plan.units.iter() {
            if budget.is_exhausted() {
                info!(
                    elapsed_sec = budget.elapsed().as_secs_f64(),
                    max_sec = budget.max_duration().map(|d| d.as_secs_f64()),
                    "elapsed time has reached the max allowed time, stopping"
                );
                stopped_early = true;
                break;
            }

            let run_index = self.core.tally().runs + 1;
            let description = unit.description();
            info!(
                "\n{}\nStarting test run #{} - {}\n{}",
                "=".repeat(BANNER_WIDTH),
                run_index,
                description,
                "=".repeat(BANNER_WIDTH)
            );

            let request = ExecRequest::new(harness.for_unit(unit))
                .with_timeout(self.cfg.config.unit_timeout())
                .capture_to(&self.cfg.config.logs_dir, &capture_prefix(unit, run_index))
                .show_lines(self.cfg.config.show_lines);

            let started = Instant::now();
            let result = self.runner.run(request).await?;
            let elapsed = started.elapsed();

            if result.timed_out {
                mark_engine_log_timeout(&self.cfg.config.engine_log_path());
            }

            self.core.record(unit, elapsed, &result);

            self.reorganize_results(&unit.nemesis_set).await;

            info!(
                "\n{}\nFinished test run #{} ({})\n{}",
                "=".repeat(BANNER_WIDTH),
                run_index,
                description,
                "=".repeat(BANNER_WIDTH)
            );
            self.core.tally().log_summary(budget.elapsed());
        }

        if !plan.skipped.is_empty() {
            warn!(skipped = ?plan.skipped, "skipped workloads because of version incompatibility");
        }

        let report = self.core.build_report(
            &plan.nemesis_set,
            plan.version.as_str(),
            &self.settings.build_url,
            Utc::now(),
        );
        self.publish(&report).await;

        info!("storing JUnit XML report locally");
        let report_path = report.write_to(&self.cfg.config.report_dir)?;

        Ok(RunSummary {
            report,
            report_path,
            tally: self.core.tally().clone(),
            stopped_early,
        })
    }

    /// Tidy the harness result store between units. Failure is logged only.
    async fn reorganize_results(&mut self, nemesis_set: &str) {
        let Some(script) = self.cfg.config.sort_results_script.clone() else {
            return;
        };

        let request = ExecRequest::new(format!("{script} {nemesis_set}"));
        match self.runner.run(request).await {
            Ok(result) if result.return_code != 0 => {
                warn!(exit_code = result.return_code, "sorting results failed; continuing");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "could not run results sorting script; continuing"),
        }
    }

    async fn publish(&self, report: &TestSuiteReport) {
        let Some(client) = &self.publisher else {
            warn!("skipped ReportPortal reporting due to missing arguments");
            return;
        };

        info!("sending JUnit XML report");
        let xml = match report.to_junit_xml() {
            Ok(xml) => xml,
            Err(e) => {
                error!(error = %e, "could not serialize report for publishing");
                return;
            }
        };

        if let Err(e) = client
            .publish(&report.file_name(), &xml, &report.version, &report.build_url)
            .await
        {
            error!(
                base_url = %client.config().base_url,
                error = %e,
                "can't send report to ReportPortal"
            );
        }
    }
}

/// Best-effort: append [`TIMEOUT_MARKER`] to the harness log so the timeout
/// is visible next to the run's own output.
pub fn mark_engine_log_timeout(path: &Path) {
    info!(path = %path.display(), "test timed out; updating the log");
    if !path.exists() {
        warn!(path = %path.display(), "engine log does not exist");
        return;
    }

    let appended = OpenOptions::new()
        .append(true)
        .open(path)
        .and_then(|mut f| f.write_all(TIMEOUT_MARKER.as_bytes()));
    if let Err(e) = appended {
        warn!(path = %path.display(), error = %e, "failed to append timeout marker");
    }
}
