// src/report/mod.rs

//! Result aggregation and reporting.
//!
//! - [`aggregator`]: one [`TestCaseRecord`] per test name, sticky failures.
//! - [`junit`]: the suite-level report and its JUnit XML form.
//! - [`publish`]: optional upload to a ReportPortal collector.

pub mod aggregator;
pub mod junit;
pub mod publish;

pub use aggregator::{ReportAggregator, TestCaseRecord};
pub use junit::TestSuiteReport;
pub use publish::{LaunchAttributes, PublishError, ReportPortalClient, ReportPortalConfig};
