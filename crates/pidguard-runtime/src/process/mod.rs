//! Operating-system process control.

mod control;
mod details;

pub use control::{OsProcessControl, probe_pid, send_signal};
pub use details::describe_process;
