//! Wiring of the OS adapters into a [`PidStore`].

use std::path::Path;
use std::sync::Arc;

use pidguard_core::{Pid, PidStore, PidStoreConfig, PidStoreResult};

use crate::pidfile::{FsRecordFile, SweepReport, sweep_stale_records};
use crate::process::OsProcessControl;

/// Open a store on the local filesystem and process table.
///
/// Resolves `config.path` and creates its parent directory.
pub async fn open_store(config: &PidStoreConfig) -> PidStoreResult<PidStore> {
    PidStore::open(
        config,
        Arc::new(FsRecordFile::new()),
        Arc::new(OsProcessControl::new()),
    )
    .await
}

/// Open a store configured from `PIDGUARD_PID_FILE` / `PIDGUARD_REAP_STALE`.
pub async fn open_store_from_env() -> PidStoreResult<PidStore> {
    open_store(&PidStoreConfig::from_env()).await
}

/// Sweep `dir` for stale records using the OS adapters.
pub async fn sweep_directory(dir: &Path) -> PidStoreResult<SweepReport> {
    sweep_stale_records(
        dir,
        Arc::new(FsRecordFile::new()),
        Arc::new(OsProcessControl::new()),
    )
    .await
}

/// PID of the calling process.
///
/// `None` only if the OS reports PID 0, which no user process has.
pub fn current_pid() -> Option<Pid> {
    Pid::new(std::process::id())
}
