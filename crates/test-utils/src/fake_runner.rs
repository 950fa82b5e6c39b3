use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use jepsen_matrix::errors::Result;
use jepsen_matrix::exec::{CmdResult, CommandRunner, ExecRequest};

pub fn pass() -> CmdResult {
    CmdResult {
        output_tail: Vec::new(),
        return_code: 0,
        timed_out: false,
        everything_looks_good: true,
        pid: None,
    }
}

pub fn non_zero(code: i32) -> CmdResult {
    CmdResult {
        output_tail: vec![format!("harness exited with {code}")],
        return_code: code,
        timed_out: false,
        everything_looks_good: false,
        pid: None,
    }
}

pub fn validation_failure() -> CmdResult {
    CmdResult {
        output_tail: vec!["Analysis invalid! (ﾉಥ益ಥ）ﾉ ┻━┻".to_string()],
        return_code: 0,
        timed_out: false,
        everything_looks_good: false,
        pid: None,
    }
}

pub fn timed_out() -> CmdResult {
    CmdResult {
        output_tail: vec!["still running".to_string()],
        return_code: -9,
        timed_out: true,
        everything_looks_good: false,
        pid: None,
    }
}

/// A fake runner that:
/// - records every request it was given
/// - answers with the result of the first rule whose needle occurs in the
///   command, or the default result.
///
/// Rules are consumed in order per needle, so a needle registered twice
/// answers differently on its first and second match.
pub struct FakeRunner {
    executed: Arc<Mutex<Vec<ExecRequest>>>,
    rules: Vec<(String, CmdResult)>,
    default: CmdResult,
}

impl FakeRunner {
    pub fn new(default: CmdResult) -> Self {
        Self {
            executed: Arc::new(Mutex::new(Vec::new())),
            rules: Vec::new(),
            default,
        }
    }

    pub fn on(mut self, needle: &str, result: CmdResult) -> Self {
        self.rules.push((needle.to_string(), result));
        self
    }

    /// Shared view of the requests seen so far.
    pub fn executed(&self) -> Arc<Mutex<Vec<ExecRequest>>> {
        Arc::clone(&self.executed)
    }

    fn answer(&mut self, command: &str) -> CmdResult {
        let matching: Vec<usize> = self
            .rules
            .iter()
            .enumerate()
            .filter(|(_, (needle, _))| command.contains(needle.as_str()))
            .map(|(i, _)| i)
            .collect();

        match matching.as_slice() {
            [] => self.default.clone(),
            // The last remaining match keeps answering.
            [only] => self.rules[*only].1.clone(),
            [first, ..] => self.rules.remove(*first).1,
        }
    }
}

impl CommandRunner for FakeRunner {
    fn run(
        &mut self,
        request: ExecRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CmdResult>> + Send + '_>> {
        let result = self.answer(&request.command);
        self.executed.lock().unwrap().push(request);
        Box::pin(async move { Ok(result) })
    }
}
