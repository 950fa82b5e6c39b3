// src/exec/cleanup.rs

//! Shutdown sweep over the [`ProcessRegistry`].
//!
//! Every registered child gets a share of one overall grace period to exit
//! on its own and is then SIGKILLed together with its process group.
//! "No such process" is expected (the child may exit between the check and
//! the kill) and ignored; any other OS error is reported after the sweep
//! has finished draining the registry.

use std::fs;
use std::io;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::{debug, error, info, warn};

use crate::errors::{MatrixError, Result};
use crate::exec::registry::ProcessRegistry;
use crate::exec::supervisor::kill_process_group;

pub const DEFAULT_CLEANUP_GRACE: Duration = Duration::from_secs(5);

const LIVENESS_POLL: Duration = Duration::from_millis(100);

/// Kill whatever is still registered and empty the registry.
///
/// Returns how many entries were swept. Safe to call repeatedly: a second
/// call finds an empty registry and returns `Ok(0)` straight away.
pub fn sweep(registry: &ProcessRegistry, grace: Duration) -> Result<usize> {
    let entries = registry.snapshot();
    if entries.is_empty() {
        debug!("cleanup: no managed processes left");
        return Ok(0);
    }

    info!(count = entries.len(), "cleanup: terminating managed processes");
    let deadline = Instant::now() + grace;
    let mut first_error: Option<io::Error> = None;

    for entry in entries.iter() {
        let pid = Pid::from_raw(entry.pid as i32);

        while is_alive(pid) && Instant::now() < deadline {
            std::thread::sleep(LIVENESS_POLL);
        }

        if let Err(e) = force_kill(entry.pid) {
            error!(pid = entry.pid, cmd = %entry.command, error = %e, "cleanup: failed to kill process");
            first_error.get_or_insert(e);
        }

        registry.deregister(entry.pid);
    }

    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(entries.len()),
    }
}

fn is_alive(pid: Pid) -> bool {
    match kill(pid, None) {
        Ok(()) => !is_zombie(pid),
        Err(Errno::ESRCH) => false,
        // EPERM means it exists but is not ours to signal.
        Err(_) => true,
    }
}

/// An exited child nobody has reaped yet still answers signal 0. Its
/// state letter in `/proc/<pid>/stat` is `Z` (or `X` while being torn
/// down). Without procfs this reports `false`.
fn is_zombie(pid: Pid) -> bool {
    let Ok(stat) = fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    // The command name is parenthesised and may itself contain spaces or
    // parentheses, so the state is the first field after the last `)`.
    stat.rsplit_once(')')
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .is_some_and(|state| state == "Z" || state == "X")
}

fn force_kill(pid: u32) -> io::Result<()> {
    match kill(Pid::from_raw(pid as i32), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => return Err(e.into()),
    }
    kill_process_group(pid)
}

/// Scope guard that sweeps the registry when dropped.
///
/// Create it before the first child is spawned so that every exit path out
/// of the run (normal return, `?` propagation, panic unwinding) goes through
/// the sweep.
#[derive(Debug)]
pub struct CleanupGuard {
    registry: ProcessRegistry,
    grace: Duration,
}

impl CleanupGuard {
    pub fn new(registry: ProcessRegistry, grace: Duration) -> Self {
        Self { registry, grace }
    }

    pub fn registry(&self) -> &ProcessRegistry {
        &self.registry
    }

    /// Sweep now instead of waiting for drop.
    pub fn run(&self) -> Result<usize> {
        sweep(&self.registry, self.grace)
    }

    /// [`run`](Self::run) on Tokio's blocking pool, for async callers.
    pub async fn run_async(&self) -> Result<usize> {
        let registry = self.registry.clone();
        let grace = self.grace;
        tokio::task::spawn_blocking(move || sweep(&registry, grace))
            .await
            .map_err(|e| MatrixError::Other(anyhow::anyhow!("cleanup task failed: {e}")))?
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        // Dropped on a multi-threaded runtime worker: tell Tokio this thread
        // is about to block so other tasks move off it.
        let on_worker = Handle::try_current()
            .is_ok_and(|handle| handle.runtime_flavor() == RuntimeFlavor::MultiThread);
        let result = if on_worker {
            tokio::task::block_in_place(|| self.run())
        } else {
            self.run()
        };
        if let Err(e) = result {
            warn!(error = %e, "cleanup on exit reported an error");
        }
    }
}
