// src/exec/backend.rs

//! Pluggable command runner abstraction.
//!
//! The run loop talks to a `CommandRunner` instead of spawning processes
//! itself. Production uses [`ProcessSupervisor`]; tests can provide a fake
//! that hands back canned [`CmdResult`]s.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;
use crate::exec::supervisor::{CmdResult, ExecRequest, ProcessSupervisor};

/// Trait abstracting how a command is executed and resolved.
pub trait CommandRunner: Send {
    fn run(
        &mut self,
        request: ExecRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CmdResult>> + Send + '_>>;
}

impl CommandRunner for ProcessSupervisor {
    fn run(
        &mut self,
        request: ExecRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CmdResult>> + Send + '_>> {
        Box::pin(async move { self.execute(&request).await })
    }
}
