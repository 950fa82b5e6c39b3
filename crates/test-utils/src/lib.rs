//! Shared fixtures for the `jepsen-matrix` integration tests.
//!
//! - [`builders`]: config, settings and unit constructors.
//! - [`fake_runner`]: a `CommandRunner` that answers with canned results.

pub mod builders;
pub mod fake_runner;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness's capture.
///
/// Only failing tests show their logs unless run with `--nocapture`.
/// `RUST_LOG` overrides the default `info,jepsen_matrix=debug` filter.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,jepsen_matrix=debug"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `fut`, panicking if it takes longer than `limit`.
pub async fn with_timeout<F, T>(limit: Duration, fut: F) -> T
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(value) => value,
        Err(_) => panic!("test future did not finish within {limit:?}"),
    }
}
