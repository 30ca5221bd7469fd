//! Domain types for PID records.

mod pid;
mod record;
mod signal;

pub use pid::{MAX_PID, Pid, PidParseError};
pub use record::{Liveness, ProcessDetails, RecordSnapshot, RecordStatus};
pub use signal::SignalKind;
