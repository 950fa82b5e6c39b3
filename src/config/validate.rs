// src/config/validate.rs

use std::collections::HashMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{MatrixError, Result};
use crate::plan::Version;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::MatrixError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.workloads, raw.nemeses))
    }
}

/// Re-run validation on an already constructed config (e.g. one built in a
/// test and then mutated).
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    let raw = RawConfigFile {
        config: cfg.config.clone(),
        workloads: cfg.workloads.clone(),
        nemeses: cfg.nemeses.clone(),
    };
    validate_raw_config(&raw)
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_workloads(cfg)?;
    validate_version_table(cfg)?;
    validate_time_limits(cfg)?;
    validate_global_config(cfg)?;
    Ok(())
}

fn ensure_has_workloads(cfg: &RawConfigFile) -> Result<()> {
    if cfg.workloads.iter().all(|group| group.tests.is_empty()) {
        return Err(MatrixError::ConfigError(
            "config must contain at least one [[workloads]] entry with tests".to_string(),
        ));
    }
    Ok(())
}

fn validate_version_table(cfg: &RawConfigFile) -> Result<()> {
    let mut seen: HashMap<&str, &str> = HashMap::new();

    for group in cfg.workloads.iter() {
        group.start_version.parse::<Version>().map_err(|e| {
            MatrixError::ConfigError(format!(
                "invalid start_version '{}': {}",
                group.start_version, e
            ))
        })?;

        for test in group.tests.iter() {
            if let Some(previous) = seen.insert(test.as_str(), group.start_version.as_str()) {
                return Err(MatrixError::ConfigError(format!(
                    "workload '{}' is listed under both start_version '{}' and '{}'",
                    test, previous, group.start_version
                )));
            }
        }
    }
    Ok(())
}

fn validate_time_limits(cfg: &RawConfigFile) -> Result<()> {
    let c = &cfg.config;

    // The harness needs time to analyse the history after the workload ends.
    let longest_run = c.run_time_sec.max(c.set_run_time_sec);
    if c.unit_timeout_sec <= longest_run {
        return Err(MatrixError::ConfigError(format!(
            "[config].unit_timeout_sec ({}) must be greater than the workload run time ({})",
            c.unit_timeout_sec, longest_run
        )));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    let c = &cfg.config;

    if c.tail_lines == 0 {
        return Err(MatrixError::ConfigError(
            "[config].tail_lines must be >= 1 (got 0)".to_string(),
        ));
    }
    if c.poll_interval_ms == 0 {
        return Err(MatrixError::ConfigError(
            "[config].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if c.test_command.trim().is_empty() {
        return Err(MatrixError::ConfigError(
            "[config].test_command must not be empty".to_string(),
        ));
    }
    Ok(())
}
