// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`supervisor`] runs one command with a deadline and classifies its
//!   captured output.
//! - [`registry`] tracks every live child the orchestrator owns.
//! - [`cleanup`] kills whatever is still registered at shutdown.
//! - [`output`] reads and trims capture file tails.
//! - [`backend`] provides the `CommandRunner` seam the run loop uses, so
//!   tests can swap in a fake.

pub mod backend;
pub mod cleanup;
pub mod output;
pub mod registry;
pub mod supervisor;

pub use backend::CommandRunner;
pub use cleanup::{sweep, CleanupGuard, DEFAULT_CLEANUP_GRACE};
pub use registry::{ManagedProcess, ProcessRegistry};
pub use supervisor::{
    CapturePaths, CmdResult, ExecRequest, ProcessSupervisor, SUCCESS_SENTINEL,
};
