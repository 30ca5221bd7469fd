//! Liveness probes and signal delivery by PID.
//!
//! # Platform behavior
//! - **Unix**: `kill(2)` via `nix`; the null signal probes existence.
//!   Zombies (exited but not yet reaped) count as dead for both probing and
//!   signalling, so a stale record never accepts a signal.
//! - **Other**: `sysinfo` process table lookup and `kill_with`.

use std::io;

use async_trait::async_trait;

use pidguard_core::{ControlError, Liveness, Pid, ProcessControlPort, ProcessDetails, SignalKind};

use super::details::describe_process;

/// [`ProcessControlPort`] talking to the local operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsProcessControl;

impl OsProcessControl {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessControlPort for OsProcessControl {
    async fn probe(&self, pid: Pid) -> io::Result<Liveness> {
        probe_pid(pid)
    }

    async fn signal(&self, pid: Pid, signal: SignalKind) -> Result<(), ControlError> {
        send_signal(pid, signal)
    }

    async fn describe(&self, pid: Pid) -> Option<ProcessDetails> {
        tokio::task::spawn_blocking(move || describe_process(pid))
            .await
            .ok()
            .flatten()
    }
}

#[cfg(unix)]
fn nix_pid(pid: Pid) -> io::Result<nix::unistd::Pid> {
    i32::try_from(pid.get())
        .map(nix::unistd::Pid::from_raw)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "PID out of range"))
}

#[cfg(unix)]
const fn nix_signal(kind: SignalKind) -> nix::sys::signal::Signal {
    use nix::sys::signal::Signal;

    match kind {
        SignalKind::Term => Signal::SIGTERM,
        SignalKind::Int => Signal::SIGINT,
        SignalKind::Hup => Signal::SIGHUP,
        SignalKind::Quit => Signal::SIGQUIT,
        SignalKind::Kill => Signal::SIGKILL,
        SignalKind::Usr1 => Signal::SIGUSR1,
        SignalKind::Usr2 => Signal::SIGUSR2,
    }
}

/// Check whether a PID exists using the null signal.
#[cfg(unix)]
pub fn probe_pid(pid: Pid) -> io::Result<Liveness> {
    use nix::errno::Errno;
    use nix::sys::signal;

    match signal::kill(nix_pid(pid)?, None) {
        Ok(()) if is_zombie(pid) => Ok(Liveness::Dead),
        Ok(()) => Ok(Liveness::Alive),
        Err(Errno::ESRCH) => Ok(Liveness::Dead),
        // Exists, but owned by someone else
        Err(Errno::EPERM) => Ok(Liveness::Alive),
        Err(e) => Err(io::Error::from(e)),
    }
}

/// Deliver `kind` to `pid`. A zombie is reported as `NoSuchProcess`.
#[cfg(unix)]
pub fn send_signal(pid: Pid, kind: SignalKind) -> Result<(), ControlError> {
    use nix::errno::Errno;
    use nix::sys::signal;

    let target = nix_pid(pid)?;
    if is_zombie(pid) {
        return Err(ControlError::NoSuchProcess);
    }
    match signal::kill(target, nix_signal(kind)) {
        Ok(()) => Ok(()),
        Err(Errno::ESRCH) => Err(ControlError::NoSuchProcess),
        Err(Errno::EPERM) => Err(ControlError::PermissionDenied),
        Err(e) => Err(ControlError::Os(io::Error::from(e))),
    }
}

/// Zombie check from `/proc/<pid>/stat`.
///
/// The state is the first field after the parenthesised command name, which
/// may itself contain spaces and parentheses, so split on the last `)`.
#[cfg(target_os = "linux")]
fn is_zombie(pid: Pid) -> bool {
    let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) else {
        return false;
    };
    stat.rsplit_once(')')
        .and_then(|(_, rest)| rest.split_whitespace().next())
        .is_some_and(|state| state == "Z" || state == "X")
}

#[cfg(all(unix, not(target_os = "linux")))]
fn is_zombie(pid: Pid) -> bool {
    use sysinfo::{ProcessStatus, ProcessesToUpdate, System};

    let target = sysinfo::Pid::from_u32(pid.get());
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[target]), true);
    sys.process(target)
        .is_some_and(|p| matches!(p.status(), ProcessStatus::Zombie | ProcessStatus::Dead))
}

#[cfg(not(unix))]
pub fn probe_pid(pid: Pid) -> io::Result<Liveness> {
    use sysinfo::{ProcessesToUpdate, System};

    let target = sysinfo::Pid::from_u32(pid.get());
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[target]), true);
    Ok(if sys.process(target).is_some() {
        Liveness::Alive
    } else {
        Liveness::Dead
    })
}

#[cfg(not(unix))]
pub fn send_signal(pid: Pid, kind: SignalKind) -> Result<(), ControlError> {
    use sysinfo::{ProcessesToUpdate, Signal, System};

    let target = sysinfo::Pid::from_u32(pid.get());
    let mut sys = System::new();
    sys.refresh_processes(ProcessesToUpdate::Some(&[target]), true);
    let process = sys.process(target).ok_or(ControlError::NoSuchProcess)?;

    let signal = match kind {
        SignalKind::Term => Signal::Term,
        SignalKind::Int => Signal::Interrupt,
        SignalKind::Hup => Signal::Hangup,
        SignalKind::Quit => Signal::Quit,
        SignalKind::Kill => Signal::Kill,
        SignalKind::Usr1 => Signal::User1,
        SignalKind::Usr2 => Signal::User2,
    };

    match process.kill_with(signal) {
        Some(true) => Ok(()),
        Some(false) => Err(ControlError::Os(io::Error::other(format!(
            "failed to deliver {kind} to process {pid}"
        )))),
        None => Err(ControlError::Unsupported(kind.to_string())),
    }
}
