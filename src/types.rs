// src/types.rs

use std::fmt;
use std::str::FromStr;

/// Final classification of one test unit run.
///
/// - `Pass`: the harness printed the success sentinel.
/// - `ValidationFailure`: exited zero but the sentinel never showed up.
/// - `Timeout`: the per-unit deadline expired and the process was killed.
/// - `NonZeroExit`: exited on its own with a non-zero code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestStatus {
    Pass,
    ValidationFailure,
    Timeout,
    NonZeroExit,
}

impl TestStatus {
    pub fn is_pass(self) -> bool {
        matches!(self, TestStatus::Pass)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TestStatus::Pass => "pass",
            TestStatus::ValidationFailure => "validation-failure",
            TestStatus::Timeout => "timeout",
            TestStatus::NonZeroExit => "non-zero-exit",
        };
        f.write_str(s)
    }
}

/// How many client workers the harness runs, e.g. `4n` (four per node) or
/// a bare `10`.
///
/// We only validate the shape; the harness interprets the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Concurrency(String);

impl Concurrency {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Concurrency {
    fn default() -> Self {
        Concurrency("4n".to_string())
    }
}

impl fmt::Display for Concurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Concurrency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_suffix('n').unwrap_or(trimmed);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!(
                "invalid concurrency: {trimmed} (expected e.g. \"4n\" or \"10\")"
            ));
        }
        Ok(Concurrency(trimmed.to_string()))
    }
}
