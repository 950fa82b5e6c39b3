// src/engine/classify.rs

use crate::exec::CmdResult;
use crate::types::TestStatus;

/// Map a resolved command to exactly one status.
///
/// A timeout wins over everything else, including a sentinel that made it
/// into the output before the kill; the raw flags stay on the `CmdResult`.
pub fn classify(result: &CmdResult) -> TestStatus {
    if result.timed_out {
        TestStatus::Timeout
    } else if result.everything_looks_good {
        TestStatus::Pass
    } else if result.return_code == 0 {
        TestStatus::ValidationFailure
    } else {
        TestStatus::NonZeroExit
    }
}
