// src/logging.rs

//! Process-wide `tracing` subscriber.
//!
//! The filter is picked in this order:
//! 1. `--log-level` on the command line;
//! 2. `JEPSEN_MATRIX_LOG`, which accepts full `EnvFilter` directives such
//!    as `info,jepsen_matrix::exec=debug`;
//! 3. `info`.
//!
//! HTTP client internals are held at `warn` unless a directive names them.
//! Everything goes to stderr; uncaptured harness output owns stdout.

use anyhow::{Context, Result};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "JEPSEN_MATRIX_LOG";

const NOISY_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls"];

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let filter = build_filter(cli_level, env_value.as_deref())?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise logging: {e}"))
}

/// Resolve the filter from the CLI level and the raw `JEPSEN_MATRIX_LOG`
/// value.
pub fn build_filter(cli_level: Option<LogLevel>, env_value: Option<&str>) -> Result<EnvFilter> {
    let directives = match (cli_level, env_value.map(str::trim)) {
        (Some(level), _) => level_directive(level).to_string(),
        (None, Some(value)) if !value.is_empty() => value.to_string(),
        _ => "info".to_string(),
    };

    let mut filter = EnvFilter::try_new(&directives)
        .with_context(|| format!("invalid log filter '{directives}'"))?;

    for target in NOISY_TARGETS {
        if !directives.contains(target) {
            filter = filter.add_directive(format!("{target}=warn").parse::<Directive>()?);
        }
    }
    Ok(filter)
}

fn level_directive(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
