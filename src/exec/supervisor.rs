// src/exec/supervisor.rs

//! Single-command process supervision.
//!
//! [`ProcessSupervisor::execute`] spawns one shell command, watches it
//! until it exits or its deadline passes, and reports a [`CmdResult`].
//!
//! Waiting is a cooperative poll: the child is checked with `try_wait`
//! and the task sleeps for at most one poll interval in between. That is
//! how deadline expiry is noticed, so the interval bounds how late a kill
//! can be.

use std::fs::{self, File};
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use tokio::process::{Child, Command};
use tracing::{debug, error, info, warn};

use crate::errors::{MatrixError, Result};
use crate::exec::output::{last_lines, show_last_lines, truncate_line, MAX_LINE_CHARS};
use crate::exec::registry::{ManagedProcess, ProcessRegistry};

/// Line prefix the harness prints once a run has been fully validated.
pub const SUCCESS_SENTINEL: &str = "Everything looks good!";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Lines of captured stdout scanned for [`SUCCESS_SENTINEL`].
pub const DEFAULT_TAIL_LINES: usize = 50;

/// stdout/stderr capture file pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturePaths {
    pub stdout: PathBuf,
    pub stderr: PathBuf,
}

impl CapturePaths {
    /// `<dir>/<prefix>_stdout.log` and `<dir>/<prefix>_stderr.log`.
    pub fn from_prefix(dir: &Path, prefix: &str) -> Self {
        Self {
            stdout: dir.join(format!("{prefix}_stdout.log")),
            stderr: dir.join(format!("{prefix}_stderr.log")),
        }
    }
}

/// What to run and how to supervise it.
#[derive(Debug, Clone)]
pub struct ExecRequest {
    pub command: String,
    /// Overall deadline; `None` waits for as long as it takes.
    pub timeout: Option<Duration>,
    /// Redirect stdout/stderr to files. Without it the child inherits ours.
    pub capture: Option<CapturePaths>,
    /// Treat a non-zero exit as fatal for the whole orchestrator.
    pub abort_on_non_zero: bool,
    /// Echo this many trailing lines of each capture file into the log.
    pub show_lines: Option<usize>,
}

impl ExecRequest {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            timeout: None,
            capture: None,
            abort_on_non_zero: false,
            show_lines: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn capture_to(mut self, dir: &Path, prefix: &str) -> Self {
        self.capture = Some(CapturePaths::from_prefix(dir, prefix));
        self
    }

    pub fn abort_on_non_zero(mut self, abort: bool) -> Self {
        self.abort_on_non_zero = abort;
        self
    }

    pub fn show_lines(mut self, n_lines: usize) -> Self {
        self.show_lines = Some(n_lines);
        self
    }
}

/// Resolved outcome of one supervised command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdResult {
    /// Tail of captured stdout (truncated lines). Empty when the run
    /// finished in time with the sentinel, or nothing was captured.
    pub output_tail: Vec<String>,
    /// Exit code, or the negated signal number if the child was killed.
    pub return_code: i32,
    pub timed_out: bool,
    pub everything_looks_good: bool,
    pub pid: Option<u32>,
}

impl CmdResult {
    pub fn output_excerpt(&self) -> Option<String> {
        if self.output_tail.is_empty() {
            None
        } else {
            Some(self.output_tail.join("\n"))
        }
    }
}

/// Runs commands one at a time and keeps the [`ProcessRegistry`] in sync.
#[derive(Debug, Clone)]
pub struct ProcessSupervisor {
    registry: ProcessRegistry,
    poll_interval: Duration,
    tail_lines: usize,
}

impl ProcessSupervisor {
    pub fn new(registry: ProcessRegistry) -> Self {
        Self {
            registry,
            poll_interval: DEFAULT_POLL_INTERVAL,
            tail_lines: DEFAULT_TAIL_LINES,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_tail_lines(mut self, tail_lines: usize) -> Self {
        self.tail_lines = tail_lines.max(1);
        self
    }

    pub fn registry(&self) -> &ProcessRegistry {
        &self.registry
    }

    /// Run `request.command` under `sh -c` and wait for it to resolve.
    ///
    /// Errors:
    /// - [`MatrixError::SpawnError`] if the shell cannot be started.
    /// - [`MatrixError::FatalSetupFailure`] if `abort_on_non_zero` is set
    ///   and the command exits non-zero.
    ///
    /// Timeouts and ordinary non-zero exits are reported in the result.
    pub async fn execute(&self, request: &ExecRequest) -> Result<CmdResult> {
        info!(cmd = %request.command, "running command");

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&request.command)
            .process_group(0)
            .kill_on_drop(true);

        if let Some(capture) = &request.capture {
            info!(stdout = %capture.stdout.display(), stderr = %capture.stderr.display(), "capturing output");
            cmd.stdout(Stdio::from(create_capture_file(&capture.stdout)?))
                .stderr(Stdio::from(create_capture_file(&capture.stderr)?));
        }

        let mut child = cmd.spawn().map_err(|source| MatrixError::SpawnError {
            command: request.command.clone(),
            source,
        })?;

        let started_at = Instant::now();
        let deadline = request.timeout.map(|t| started_at + t);
        let pid = child.id();

        if let Some(pid) = pid {
            self.registry.register(ManagedProcess {
                pid,
                command: request.command.clone(),
                started_at,
                deadline,
                stdout_path: request.capture.as_ref().map(|c| c.stdout.clone()),
                stderr_path: request.capture.as_ref().map(|c| c.stderr.clone()),
            });
        }

        let waited = self.wait_until_resolved(&mut child, pid, deadline).await;

        // Resolved (or failed to wait, in which case kill_on_drop reaps it).
        if let Some(pid) = pid {
            self.registry.deregister(pid);
        }
        let (status, timed_out) = waited?;
        let return_code = exit_code(status);

        debug!(
            cmd = %request.command,
            return_code,
            timed_out,
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "command resolved"
        );

        if return_code != 0 {
            error!(exit_code = return_code, cmd = %request.command, "failed running command");
        }

        let mut tail = Vec::new();
        let mut everything_looks_good = false;
        if let Some(capture) = &request.capture {
            if capture.stdout.exists() {
                match last_lines(&capture.stdout, self.tail_lines) {
                    Ok((lines, _total)) => {
                        everything_looks_good =
                            lines.iter().any(|l| l.starts_with(SUCCESS_SENTINEL));
                        tail = lines;
                    }
                    Err(e) => warn!(
                        path = %capture.stdout.display(),
                        error = %e,
                        "failed to read captured stdout"
                    ),
                }
            }

            if let Some(n_lines) = request.show_lines {
                show_last_lines(&capture.stdout, n_lines);
                show_last_lines(&capture.stderr, n_lines);
            }
        }

        if return_code != 0 && request.abort_on_non_zero {
            return Err(MatrixError::FatalSetupFailure {
                command: request.command.clone(),
                code: return_code,
            });
        }

        // A run killed on its deadline keeps its files even if the sentinel
        // made it out before the kill.
        let validated = everything_looks_good && !timed_out;
        if validated {
            if let Some(capture) = &request.capture {
                remove_capture_file(&capture.stdout);
                remove_capture_file(&capture.stderr);
            }
        }

        let output_tail = if validated {
            Vec::new()
        } else {
            tail.iter().map(|l| truncate_line(l, MAX_LINE_CHARS)).collect()
        };

        Ok(CmdResult {
            output_tail,
            return_code,
            timed_out,
            everything_looks_good,
            pid,
        })
    }

    /// Poll until the child exits or `deadline` passes. On expiry the whole
    /// process group is killed and reaped before returning.
    async fn wait_until_resolved(
        &self,
        child: &mut Child,
        pid: Option<u32>,
        deadline: Option<Instant>,
    ) -> Result<(ExitStatus, bool)> {
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok((status, false));
            }

            let nap = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    self.poll_interval.min(deadline - now)
                }
                None => self.poll_interval,
            };
            tokio::time::sleep(nap).await;
        }

        warn!(?pid, "command exceeded its deadline; killing it");
        if let Some(pid) = pid {
            kill_process_group(pid)?;
        }
        // The leader may already be a zombie; start_kill is still fine then.
        child.start_kill()?;
        let status = child.wait().await?;
        Ok((status, true))
    }
}

fn create_capture_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(File::create(path)?)
}

fn remove_capture_file(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        error!(path = %path.display(), error = %e, "error deleting output log, ignoring");
    }
}

/// SIGKILL every process in the group led by `pid`. A group that is
/// already gone is not an error.
pub(crate) fn kill_process_group(pid: u32) -> std::io::Result<()> {
    match killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Exit code with the POSIX convention of `-signal` for killed children.
fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|s| -s))
        .unwrap_or(-1)
}
