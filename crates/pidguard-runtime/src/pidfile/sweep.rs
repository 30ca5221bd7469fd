//! Directory-wide cleanup of stale records left behind by crashed processes.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio::fs;
use tracing::{debug, info, warn};

use pidguard_core::{
    Pid, PidStore, PidStoreConfig, PidStoreError, PidStoreResult, ProcessControlPort,
    RecordFilePort, RecordStatus,
};

/// Extension identifying record files during a sweep.
pub const RECORD_EXTENSION: &str = "pid";

/// Outcome of [`sweep_stale_records`].
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Records naming a live process, left untouched.
    pub live: Vec<PathBuf>,
    /// Stale records that were removed, with the PID each named.
    pub reaped: Vec<(PathBuf, Pid)>,
    /// Records that could not be parsed. Reported, never deleted.
    pub corrupt: Vec<PathBuf>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.live.is_empty() && self.reaped.is_empty() && self.corrupt.is_empty()
    }
}

/// Reap every stale `*.pid` record in `dir`.
///
/// # Strategy
/// 1. List visible `*.pid` files in `dir` (hidden temp files and tombstones
///    are skipped)
/// 2. For each record, probe the PID it names:
///    - live: leave it
///    - stale: remove it through compare-and-remove, so a record replaced
///      by a concurrent writer survives
///    - corrupt: report it
/// 3. Log results
///
/// A missing directory yields an empty report.
pub async fn sweep_stale_records(
    dir: &Path,
    files: Arc<dyn RecordFilePort>,
    control: Arc<dyn ProcessControlPort>,
) -> PidStoreResult<SweepReport> {
    let records = list_records(dir).await?;
    let mut report = SweepReport::default();

    if records.is_empty() {
        debug!("No PID records found in {}", dir.display());
        return Ok(report);
    }

    debug!("Sweeping {} PID records in {}", records.len(), dir.display());

    for path in records {
        let store = PidStore::open(
            &PidStoreConfig::new(&path),
            Arc::clone(&files),
            Arc::clone(&control),
        )
        .await?;

        match store.status().await {
            Ok(RecordStatus::Live(pid)) => {
                debug!("{} names live process {}", path.display(), pid);
                report.live.push(path);
            }
            Ok(RecordStatus::Stale(_)) => match store.reap().await {
                Ok(Some(pid)) => report.reaped.push((path, pid)),
                Ok(None) => debug!("{} changed during sweep, skipping", path.display()),
                Err(e) if e.is_corrupt_record() => report.corrupt.push(path),
                Err(e) => return Err(e),
            },
            Ok(RecordStatus::Absent) => {}
            Err(e) if e.is_corrupt_record() => {
                warn!("Skipping corrupt PID record {}: {}", path.display(), e);
                report.corrupt.push(path);
            }
            Err(e) => return Err(e),
        }
    }

    if !report.reaped.is_empty() || !report.corrupt.is_empty() {
        info!(
            "Sweep of {} complete: {} stale records removed, {} live, {} corrupt",
            dir.display(),
            report.reaped.len(),
            report.live.len(),
            report.corrupt.len()
        );
    }

    Ok(report)
}

async fn list_records(dir: &Path) -> PidStoreResult<Vec<PathBuf>> {
    let io_error = |source: io::Error| PidStoreError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_error(e)),
    };

    let mut records = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
        let path = entry.path();
        if is_record_name(&path) && entry.file_type().await.is_ok_and(|t| t.is_file()) {
            records.push(path);
        }
    }
    records.sort();
    Ok(records)
}

fn is_record_name(path: &Path) -> bool {
    let visible = path
        .file_name()
        .is_some_and(|name| !name.to_string_lossy().starts_with('.'));
    visible && path.extension().is_some_and(|ext| ext == RECORD_EXTENSION)
}
