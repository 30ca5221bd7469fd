//! Descriptive process details from the OS process table.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use sysinfo::{ProcessesToUpdate, System};

use pidguard_core::{Pid, ProcessDetails};

/// Look up name, executable and start time for `pid`.
///
/// Blocking; call from `spawn_blocking` in async contexts. Returns `None`
/// when the process is not visible to this user.
pub fn describe_process(pid: Pid) -> Option<ProcessDetails> {
    let target = sysinfo::Pid::from_u32(pid.get());
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[target]), true);

    let process = sys.process(target)?;
    let started_at = i64::try_from(process.start_time())
        .ok()
        .filter(|secs| *secs > 0)
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

    Some(ProcessDetails {
        name: process.name().to_string_lossy().into_owned(),
        executable: process.exe().map(PathBuf::from),
        started_at,
    })
}
