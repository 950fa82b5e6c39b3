// src/plan/mod.rs

//! Matrix planning.
//!
//! Turns the configured workload list, the per-workload minimum-version
//! table and the artifact version into the ordered list of [`TestUnit`]s
//! the run loop will execute.

pub mod planner;
pub mod version;

pub use planner::{plan_matrix, MatrixPlan, TestUnit};
pub use version::{is_version_at_least, version_from_url, Version};
