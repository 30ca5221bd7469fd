//! Error taxonomy for store operations.
//!
//! Every variant is returned through `Result`; callers branch on the kind
//! with `matches!` or the `is_*` helpers.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::domain::{Pid, SignalKind};
use crate::paths::PathError;

/// Errors produced by [`PidStore`](crate::PidStore) operations.
#[derive(Debug, Error)]
pub enum PidStoreError {
    /// A write was attempted against a record whose process is alive.
    #[error("Process {pid} recorded in {path} is already running")]
    AlreadyRunning { path: PathBuf, pid: Pid },

    /// The operation needs a record and none exists.
    #[error("No process record at {path}")]
    NotFound { path: PathBuf },

    /// The record exists but its process does not.
    #[error("Process {pid} is not running")]
    ProcessNotFound { pid: Pid },

    /// The record's content is not a PID.
    #[error("Corrupt process record {path}: {reason}")]
    CorruptRecord { path: PathBuf, reason: String },

    /// The OS refused to deliver a signal.
    #[error("Permission denied sending {signal} to process {pid}")]
    PermissionDenied { pid: Pid, signal: SignalKind },

    /// Unknown signal name, or a signal this platform cannot deliver.
    #[error("Unsupported signal: {0}")]
    UnsupportedSignal(String),

    /// The claim protocol kept observing concurrent changes and gave up.
    #[error("Gave up claiming {path} after {attempts} contended attempts")]
    Contended { path: PathBuf, attempts: usize },

    /// The configured path could not be resolved or prepared.
    #[error(transparent)]
    Path(#[from] PathError),

    /// Filesystem or OS failure unrelated to the kinds above.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PidStoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub const fn is_already_running(&self) -> bool {
        matches!(self, Self::AlreadyRunning { .. })
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub const fn is_process_not_found(&self) -> bool {
        matches!(self, Self::ProcessNotFound { .. })
    }

    pub const fn is_corrupt_record(&self) -> bool {
        matches!(self, Self::CorruptRecord { .. })
    }

    pub const fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    /// Filesystem-level failure (including path preparation).
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Path(_))
    }
}

/// Result type for store operations.
pub type PidStoreResult<T> = Result<T, PidStoreError>;
