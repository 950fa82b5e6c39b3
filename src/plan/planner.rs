// src/plan/planner.rs

use std::collections::BTreeSet;

use tracing::{debug, error, info};

use crate::config::ConfigFile;
use crate::errors::{MatrixError, Result};
use crate::plan::version::Version;

/// One (workload, nemesis set, iteration) combination to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestUnit {
    pub workload: String,
    pub nemesis_set: String,
    pub iteration_index: u32,
    pub required_version: String,
}

impl TestUnit {
    /// Report key: `{workload}_{nemesis_set}`. Iterations share it.
    pub fn test_name(&self) -> String {
        format!("{}_{}", self.workload, self.nemesis_set)
    }

    /// Workload family, e.g. `ysql` for `ysql/sz.bank`.
    pub fn group_name(&self) -> &str {
        self.workload.split('/').next().unwrap_or(&self.workload)
    }

    pub fn description(&self) -> String {
        format!("workload {}, nemesis {}", self.workload, self.nemesis_set)
    }

    /// Whether this is a `*/set` workload, which gets a shorter run time.
    pub fn is_set_workload(&self) -> bool {
        self.workload.contains("/set")
    }
}

/// Ordered, version-filtered list of units.
#[derive(Debug, Clone)]
pub struct MatrixPlan {
    pub units: Vec<TestUnit>,
    /// Workloads dropped because the artifact is too old for them.
    pub skipped: Vec<String>,
    pub nemesis_set: String,
    pub version: Version,
    /// Iterations per workload.
    pub iterations: u32,
}

impl MatrixPlan {
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Build the ordered matrix for `workloads`.
///
/// Workload order is preserved and each workload is repeated `iterations`
/// times back to back. Workloads whose `start_version` is newer than
/// `actual` are skipped; if nothing survives this is a configuration error.
pub fn plan_matrix(
    cfg: &ConfigFile,
    workloads: &[String],
    nemesis_set: &str,
    iterations: u32,
    actual: &Version,
) -> Result<MatrixPlan> {
    let iterations = iterations.max(1);
    let mut units = Vec::new();
    let mut skipped = Vec::new();
    let mut seen_skipped = BTreeSet::new();

    for workload in workloads {
        let required = cfg.required_version(workload).ok_or_else(|| {
            MatrixError::ConfigError(format!(
                "unable to find workload '{}' in the version table: {:?}",
                workload,
                cfg.all_workloads()
            ))
        })?;
        let required_version: Version = required.parse()?;

        if !actual.is_at_least(&required_version) {
            debug!(
                %workload,
                required = %required_version,
                actual = %actual,
                "workload requires a newer version; skipping"
            );
            if seen_skipped.insert(workload.clone()) {
                skipped.push(workload.clone());
            }
            continue;
        }

        for iteration_index in 0..iterations {
            units.push(TestUnit {
                workload: workload.clone(),
                nemesis_set: nemesis_set.to_string(),
                iteration_index,
                required_version: required.to_string(),
            });
        }
    }

    if units.is_empty() {
        error!(
            ?skipped,
            "no workloads to evaluate because of version incompatibility"
        );
        return Err(MatrixError::ConfigError(format!(
            "no workloads left to evaluate for version {actual}; skipped: {skipped:?}"
        )));
    }

    info!(
        units = units.len(),
        skipped = skipped.len(),
        version = %actual,
        "matrix planned"
    );

    Ok(MatrixPlan {
        units,
        skipped,
        nemesis_set: nemesis_set.to_string(),
        version: actual.clone(),
        iterations,
    })
}
