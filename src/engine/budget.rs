// src/engine/budget.rs

use std::time::{Duration, Instant};

/// Global wall-clock budget for the whole run.
///
/// Only consulted between units; a unit already running is never cut short
/// by the budget (its own deadline handles that).
#[derive(Debug, Clone, Copy)]
pub struct RunBudget {
    started_at: Instant,
    max_duration: Option<Duration>,
}

impl RunBudget {
    pub fn start(max_duration: Option<Duration>) -> Self {
        Self {
            started_at: Instant::now(),
            max_duration,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn max_duration(&self) -> Option<Duration> {
        self.max_duration
    }

    /// `true` once elapsed time has reached the maximum. A zero budget is
    /// exhausted from the start.
    pub fn is_exhausted(&self) -> bool {
        self.max_duration
            .is_some_and(|max| self.elapsed() >= max)
    }
}
