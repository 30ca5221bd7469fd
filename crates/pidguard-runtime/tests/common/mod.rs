//! Shared helpers for runtime integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use pidguard_core::{Pid, PidStore, PidStoreConfig};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

/// Install a test-writer subscriber once; `RUST_LOG` selects verbosity.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A temporary directory with a record path inside it.
pub struct Scratch {
    pub dir: TempDir,
    pub path: PathBuf,
}

pub fn scratch(name: &str) -> Scratch {
    init_tracing();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(name);
    Scratch { dir, path }
}

pub async fn os_store(path: &Path) -> PidStore {
    pidguard_runtime::open_store(&PidStoreConfig::new(path))
        .await
        .expect("open store")
}

pub fn pid(raw: u32) -> Pid {
    Pid::new(raw).expect("non-zero pid")
}

pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path).expect("read record")
}

/// A `sleep` child that is killed when dropped.
#[cfg(unix)]
pub struct Sleeper {
    pub child: tokio::process::Child,
    pub pid: Pid,
}

#[cfg(unix)]
pub fn spawn_sleeper() -> Sleeper {
    let child = tokio::process::Command::new("sleep")
        .arg("30")
        .kill_on_drop(true)
        .spawn()
        .expect("spawn sleep");
    let pid = pid(child.id().expect("child pid"));
    Sleeper { child, pid }
}

/// PID of a process that has already exited and been reaped.
#[cfg(unix)]
pub async fn exited_pid() -> Pid {
    let mut child = tokio::process::Command::new("true")
        .spawn()
        .expect("spawn true");
    let pid = pid(child.id().expect("child pid"));
    child.wait().await.expect("wait true");
    pid
}
