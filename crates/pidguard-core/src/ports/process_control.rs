//! Process control port for liveness probes and signal delivery.
//!
//! Core owns the trait; platform implementations live in `pidguard-runtime`.

use std::io;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Liveness, Pid, ProcessDetails, SignalKind};

/// Errors from signal delivery.
#[derive(Debug, Error)]
pub enum ControlError {
    /// No process with this PID exists.
    #[error("No such process")]
    NoSuchProcess,

    /// The process exists but we may not signal it.
    #[error("Permission denied")]
    PermissionDenied,

    /// This platform cannot deliver the requested signal.
    #[error("Unsupported on this platform: {0}")]
    Unsupported(String),

    /// Any other OS failure.
    #[error(transparent)]
    Os(#[from] io::Error),
}

/// Port for asking the OS about processes by PID.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProcessControlPort: Send + Sync {
    /// Whether `pid` currently denotes a process.
    ///
    /// A process we lack permission to signal still counts as alive.
    async fn probe(&self, pid: Pid) -> io::Result<Liveness>;

    /// Deliver `signal` to `pid`. Fire-and-forget: does not wait for exit.
    ///
    /// Must fail with `NoSuchProcess` for any PID `probe` reports as dead.
    async fn signal(&self, pid: Pid, signal: SignalKind) -> Result<(), ControlError>;

    /// Best-effort details about a running process, `None` if unavailable.
    async fn describe(&self, pid: Pid) -> Option<ProcessDetails>;
}
