//! Record states and diagnostic snapshots.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::pid::Pid;

/// Result of an operating-system liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Liveness {
    Alive,
    Dead,
}

impl Liveness {
    pub const fn is_alive(self) -> bool {
        matches!(self, Self::Alive)
    }
}

/// State of the record at one path.
///
/// ```text
/// Absent --write--> Live(pid) --exit without cleanup--> Stale(pid)
///   ^                  |                                   |
///   +------delete------+------------delete / reap ---------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "pid", rename_all = "snake_case")]
pub enum RecordStatus {
    /// No record exists.
    Absent,
    /// The record names a process the OS currently knows about.
    Live(Pid),
    /// The record names a process that has exited.
    Stale(Pid),
}

impl RecordStatus {
    pub(crate) const fn from_probe(pid: Pid, liveness: Liveness) -> Self {
        match liveness {
            Liveness::Alive => Self::Live(pid),
            Liveness::Dead => Self::Stale(pid),
        }
    }

    pub const fn is_live(self) -> bool {
        matches!(self, Self::Live(_))
    }

    pub const fn pid(self) -> Option<Pid> {
        match self {
            Self::Absent => None,
            Self::Live(pid) | Self::Stale(pid) => Some(pid),
        }
    }
}

/// Best-effort description of a running process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDetails {
    /// Short process name as reported by the OS.
    pub name: String,
    /// Executable path, when the OS exposes it to us.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable: Option<PathBuf>,
    /// When the process started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

/// Diagnostic view of a record, for status displays and logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSnapshot {
    pub path: PathBuf,
    pub status: RecordStatus,
    /// Last modification time of the record file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written_at: Option<DateTime<Utc>>,
    /// Details of the recorded process, only for live records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process: Option<ProcessDetails>,
}

impl RecordSnapshot {
    /// Whether the live process started after its record was written.
    ///
    /// A `Some(true)` answer usually means the PID was recycled by the OS and
    /// the record's real owner is gone. `None` when either timestamp is
    /// unknown. Timestamps have whole-second precision, so a one-second slack
    /// is applied.
    pub fn started_after_record(&self) -> Option<bool> {
        let written = self.written_at?;
        let started = self.process.as_ref()?.started_at?;
        Some(started > written + chrono::Duration::seconds(1))
    }
}
