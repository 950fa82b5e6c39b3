// src/exec/registry.rs

//! Bookkeeping for every child process the orchestrator currently owns.
//!
//! An entry exists from the moment a child is spawned until the supervisor
//! has resolved it (natural exit or forced kill). The shutdown sweep in
//! [`super::cleanup`] reads the same registry, possibly from a signal
//! handler task, so all access goes through a mutex and every operation
//! tolerates entries disappearing underneath it.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// A spawned, not-yet-resolved child process.
#[derive(Debug, Clone)]
pub struct ManagedProcess {
    /// OS process id. Children run in their own process group, so this is
    /// also the process group id.
    pub pid: u32,
    pub command: String,
    pub started_at: Instant,
    pub deadline: Option<Instant>,
    pub stdout_path: Option<PathBuf>,
    pub stderr_path: Option<PathBuf>,
}

/// Shared handle to the set of live managed processes.
///
/// Cloning is cheap and every clone observes the same entries.
#[derive(Debug, Clone, Default)]
pub struct ProcessRegistry {
    inner: Arc<Mutex<BTreeMap<u32, ManagedProcess>>>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<u32, ManagedProcess>> {
        // A panic while holding the lock cannot leave a half-written map
        // behind, so a poisoned lock is still usable.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn register(&self, process: ManagedProcess) {
        self.lock().insert(process.pid, process);
    }

    /// Remove `pid`, returning its entry if it was still registered.
    pub fn deregister(&self, pid: u32) -> Option<ManagedProcess> {
        self.lock().remove(&pid)
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.lock().contains_key(&pid)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the current entries, ordered by pid.
    pub fn snapshot(&self) -> Vec<ManagedProcess> {
        self.lock().values().cloned().collect()
    }
}
