// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod plan;
pub mod report;
pub mod types;

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::cli::CliArgs;
use crate::config::{load_or_default, ConfigFile};
use crate::engine::{HarnessCommand, RunLoop, RunSettings};
use crate::errors::Result;
use crate::exec::{sweep, CleanupGuard, ProcessRegistry, ProcessSupervisor};
use crate::plan::{plan_matrix, version_from_url, MatrixPlan};
use crate::report::ReportPortalClient;

/// Exit status used when a signal interrupts the run.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// High-level entry point used by `main.rs`. Returns the process exit code.
///
/// This wires together:
/// - config loading and version parsing
/// - matrix planning
/// - the process registry, its shutdown sweep and signal handling
/// - the supervisor-backed run loop and reporting
pub async fn run(args: CliArgs) -> Result<i32> {
    let cfg = load_or_default(args.config.as_deref())?;
    let version = version_from_url(&args.url)?;
    info!(url = %args.url, %version, "testing artifact");

    let nemesis_set = args.nemesis_set(&cfg);
    let workloads = args.workload_list(&cfg);
    let plan = plan_matrix(
        &cfg,
        &workloads,
        &nemesis_set,
        args.iterations.unwrap_or(1),
        &version,
    )?;

    let settings = RunSettings {
        url: args.url.clone(),
        concurrency: args.concurrency.clone(),
        iterations: args.iterations,
        build_url: args.build_url.clone(),
        max_duration: args.max_duration(),
    };

    if args.dry_run {
        print_dry_run(&cfg, &plan, &settings);
        return Ok(0);
    }

    // Installed before anything is spawned; dropping it sweeps the registry
    // on every way out of this function.
    let registry = ProcessRegistry::new();
    let cleanup = CleanupGuard::new(registry.clone(), cfg.config.cleanup_grace());
    spawn_signal_listener(registry.clone(), cfg.config.cleanup_grace());

    let supervisor = ProcessSupervisor::new(registry)
        .with_poll_interval(cfg.config.poll_interval())
        .with_tail_lines(cfg.config.tail_lines);

    let publisher = match args.report_portal() {
        Some(rp) => match ReportPortalClient::new(rp) {
            Ok(client) => Some(client),
            Err(e) => {
                error!(error = %e, "could not create ReportPortal client; reporting disabled");
                None
            }
        },
        None => None,
    };

    let mut run_loop = RunLoop::new(cfg, settings, supervisor).with_publisher(publisher);
    run_loop.prepare().await?;
    let summary = run_loop.run(&plan).await?;

    cleanup.run_async().await?;

    info!(
        records = summary.report.records.len(),
        passed = summary.report.all_passed(),
        stopped_early = summary.stopped_early,
        report = %summary.report_path.display(),
        "run complete"
    );
    Ok(summary.exit_code())
}

/// Ctrl-C / SIGTERM → kill managed children and exit.
fn spawn_signal_listener(registry: ProcessRegistry, grace: Duration) {
    tokio::spawn(async move {
        let mut terminate =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    warn!(error = %e, "failed to listen for SIGTERM");
                    return;
                }
            };

        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                if let Err(e) = res {
                    warn!(error = %e, "failed to listen for Ctrl+C");
                    return;
                }
            }
            _ = terminate.recv() => {}
        }

        warn!("shutdown signal received; terminating managed processes");
        match tokio::task::spawn_blocking(move || sweep(&registry, grace)).await {
            Ok(Ok(count)) => debug!(count, "signal cleanup finished"),
            Ok(Err(e)) => error!(error = %e, "signal cleanup failed"),
            Err(e) => error!(error = %e, "signal cleanup task panicked"),
        }
        std::process::exit(INTERRUPTED_EXIT_CODE);
    });
}

/// Simple dry-run output: print the planned units and their commands.
fn print_dry_run(cfg: &ConfigFile, plan: &MatrixPlan, settings: &RunSettings) {
    let harness = HarnessCommand::new(&cfg.config, settings);

    println!("jepsen-matrix dry-run");
    println!("  version = {}", plan.version);
    println!("  nemeses = {}", plan.nemesis_set);
    println!("  iterations = {}", plan.iterations);
    println!("  unit_timeout_sec = {}", cfg.config.unit_timeout_sec);
    if let Some(max) = settings.max_duration {
        println!("  max_time_sec = {}", max.as_secs());
    }
    println!();

    println!("units ({}):", plan.len());
    for (i, unit) in plan.units.iter().enumerate() {
        println!("  #{} {} (iteration {})", i + 1, unit.test_name(), unit.iteration_index + 1);
        println!("      cmd: {}", harness.for_unit(unit));
    }

    if !plan.skipped.is_empty() {
        println!();
        println!("skipped (version {} too old):", plan.version);
        for workload in plan.skipped.iter() {
            println!("  - {workload}");
        }
    }

    debug!("dry-run complete (no execution)");
}
