//! PID store - the record protocol.
//!
//! # Claim protocol
//! 1. Exclusive create of the record (the only point that orders racing writers)
//! 2. On conflict, read and probe the existing record:
//!    - live: fail with `AlreadyRunning`
//!    - stale or corrupt: compare-and-remove it, then go back to 1
//! 3. Compare-and-remove renames the record to a private tombstone, checks the
//!    tombstone still holds what was probed, and links it back if a concurrent
//!    writer had replaced it in the meantime
//!
//! No locks, leases or heartbeats: a record can go stale silently until the
//! next `running()` or `write()` observes it.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::PidStoreConfig;
use crate::domain::{Liveness, Pid, RecordSnapshot, RecordStatus, SignalKind};
use crate::error::{PidStoreError, PidStoreResult};
use crate::paths::ResolvedRecordPath;
use crate::ports::{ClaimOutcome, ControlError, ProcessControlPort, RecordFilePort};

/// Upper bound on claim attempts within one `write()`.
///
/// Each attempt follows an observed state change (record vanished or was
/// removed as stale), never a failure.
pub const MAX_CLAIM_ATTEMPTS: usize = 8;

/// What compare-and-remove did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Removal {
    /// The probed record was removed.
    Removed,
    /// Nothing was at the path anymore.
    Gone,
    /// A newer record had replaced the probed one; it was put back.
    Restored,
    /// A newer record was taken and could not be put back.
    Displaced,
}

/// A record as read from disk, before probing.
struct Observed {
    content: String,
    status: RecordStatus,
}

/// Process lifecycle store bound to one record path.
///
/// Cheap to clone; holds no mutable state, so concurrent use from many
/// tasks is fine. All cross-process coordination happens on the filesystem.
#[derive(Clone)]
pub struct PidStore {
    path: PathBuf,
    reap_stale: bool,
    files: Arc<dyn RecordFilePort>,
    control: Arc<dyn ProcessControlPort>,
}

impl std::fmt::Debug for PidStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PidStore")
            .field("path", &self.path)
            .field("reap_stale", &self.reap_stale)
            .finish_non_exhaustive()
    }
}

impl PidStore {
    /// Resolve the configured path (creating its parent directory) and bind a store to it.
    pub async fn open(
        config: &PidStoreConfig,
        files: Arc<dyn RecordFilePort>,
        control: Arc<dyn ProcessControlPort>,
    ) -> PidStoreResult<Self> {
        let resolved = ResolvedRecordPath::resolve(&config.path).await?;
        Ok(Self::from_resolved(
            resolved,
            config.reap_stale,
            files,
            control,
        ))
    }

    /// Bind a store to an already resolved path.
    pub fn from_resolved(
        path: ResolvedRecordPath,
        reap_stale: bool,
        files: Arc<dyn RecordFilePort>,
        control: Arc<dyn ProcessControlPort>,
    ) -> Self {
        Self {
            path: path.into_path_buf(),
            reap_stale,
            files,
            control,
        }
    }

    /// Absolute path of the record.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Claim the record for `pid`.
    ///
    /// Succeeds if the record was absent, stale, corrupt, or already names
    /// `pid`. Fails with `AlreadyRunning` if it names another live process.
    pub async fn write(&self, pid: Pid) -> PidStoreResult<()> {
        let content = pid.to_record();

        for attempt in 1..=MAX_CLAIM_ATTEMPTS {
            let outcome = self
                .files
                .create_exclusive(&self.path, &content)
                .await
                .map_err(|e| self.io_error(e))?;
            if outcome == ClaimOutcome::Created {
                info!("Claimed {} for process {}", self.path.display(), pid);
                return Ok(());
            }

            let Some(existing) = self.read_raw().await? else {
                debug!(
                    "Record {} vanished before it could be probed (attempt {})",
                    self.path.display(),
                    attempt
                );
                continue;
            };

            match existing.parse::<Pid>() {
                Ok(current) if current == pid => {
                    debug!("{} already names process {}", self.path.display(), pid);
                    return Ok(());
                }
                Ok(current) => {
                    if self.probe(current).await?.is_alive() {
                        return Err(PidStoreError::AlreadyRunning {
                            path: self.path.clone(),
                            pid: current,
                        });
                    }
                    info!(
                        "Reclaiming stale record {} left by process {}",
                        self.path.display(),
                        current
                    );
                }
                Err(reason) => {
                    warn!(
                        "Reclaiming corrupt record {}: {}",
                        self.path.display(),
                        reason
                    );
                }
            }

            let removal = self.remove_if_unchanged(&existing).await?;
            debug!(
                "Compare-and-remove on {} finished with {:?} (attempt {})",
                self.path.display(),
                removal,
                attempt
            );
        }

        Err(PidStoreError::Contended {
            path: self.path.clone(),
            attempts: MAX_CLAIM_ATTEMPTS,
        })
    }

    /// Whether the recorded process is alive.
    ///
    /// An absent record is `false`, not an error. A stale record is `false`
    /// and is deleted only when the store was configured with `reap_stale`.
    pub async fn running(&self) -> PidStoreResult<bool> {
        let Some(observed) = self.observe().await? else {
            return Ok(false);
        };

        if let RecordStatus::Stale(pid) = observed.status {
            debug!("{} is stale (process {} exited)", self.path.display(), pid);
            if self.reap_stale {
                self.reap_observed(&observed.content, pid).await?;
            }
        }

        Ok(observed.status.is_live())
    }

    /// State of the record without mutating anything.
    pub async fn status(&self) -> PidStoreResult<RecordStatus> {
        Ok(self
            .observe()
            .await?
            .map_or(RecordStatus::Absent, |observed| observed.status))
    }

    /// The recorded PID, without probing it.
    pub async fn read_pid(&self) -> PidStoreResult<Option<Pid>> {
        match self.read_raw().await? {
            Some(content) => self.parse(&content).map(Some),
            None => Ok(None),
        }
    }

    /// Delete the record if it is stale. Returns the PID it named.
    ///
    /// A live record, or one replaced by a concurrent writer after the probe,
    /// is left alone.
    pub async fn reap(&self) -> PidStoreResult<Option<Pid>> {
        match self.observe().await? {
            Some(Observed {
                content,
                status: RecordStatus::Stale(pid),
            }) => self.reap_observed(&content, pid).await,
            _ => Ok(None),
        }
    }

    /// Deliver `signal` to the recorded process.
    ///
    /// Fire-and-forget: does not wait for exit and does not touch the record.
    /// Liveness comes from the signal attempt itself; the process port must
    /// report any process its probe calls dead (zombies included) as
    /// `NoSuchProcess`, which surfaces here as `ProcessNotFound`.
    pub async fn kill(&self, signal: SignalKind) -> PidStoreResult<()> {
        let pid = self
            .read_pid()
            .await?
            .ok_or_else(|| PidStoreError::NotFound {
                path: self.path.clone(),
            })?;

        match self.control.signal(pid, signal).await {
            Ok(()) => {
                info!("Sent {} to process {}", signal, pid);
                Ok(())
            }
            Err(ControlError::NoSuchProcess) => Err(PidStoreError::ProcessNotFound { pid }),
            Err(ControlError::PermissionDenied) => {
                Err(PidStoreError::PermissionDenied { pid, signal })
            }
            Err(ControlError::Unsupported(reason)) => Err(PidStoreError::UnsupportedSignal(
                format!("{signal} ({reason})"),
            )),
            Err(ControlError::Os(e)) => Err(self.io_error(e)),
        }
    }

    /// [`kill`](Self::kill) with a signal name such as `"TERM"` or `"SIGINT"`.
    pub async fn kill_named(&self, name: &str) -> PidStoreResult<()> {
        let signal = name.parse::<SignalKind>()?;
        self.kill(signal).await
    }

    /// Remove the record. Absent records are not an error.
    pub async fn delete(&self) -> PidStoreResult<()> {
        let removed = self
            .files
            .remove(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        if removed {
            info!("Deleted {}", self.path.display());
        } else {
            debug!("{} already absent", self.path.display());
        }
        Ok(())
    }

    /// Remove the record only if it still names `pid`.
    ///
    /// Meant for a process cleaning up after itself on shutdown: a successor
    /// that reclaimed the path in the meantime keeps its record. Returns
    /// whether a record was removed.
    pub async fn release(&self, pid: Pid) -> PidStoreResult<bool> {
        let Some(content) = self.read_raw().await? else {
            return Ok(false);
        };

        match content.parse::<Pid>() {
            Ok(current) if current == pid => {}
            Ok(current) => {
                debug!(
                    "{} now names process {}, leaving it for its owner",
                    self.path.display(),
                    current
                );
                return Ok(false);
            }
            Err(_) => return Ok(false),
        }

        let removed = self.remove_if_unchanged(&content).await? == Removal::Removed;
        if removed {
            info!("Released {} held by process {}", self.path.display(), pid);
        }
        Ok(removed)
    }

    /// Diagnostic snapshot: state, record timestamp and process details.
    pub async fn inspect(&self) -> PidStoreResult<RecordSnapshot> {
        let status = self.status().await?;
        let written_at = self
            .files
            .modified(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        let process = match status {
            RecordStatus::Live(pid) => self.control.describe(pid).await,
            RecordStatus::Stale(_) | RecordStatus::Absent => None,
        };

        Ok(RecordSnapshot {
            path: self.path.clone(),
            status,
            written_at,
            process,
        })
    }

    async fn observe(&self) -> PidStoreResult<Option<Observed>> {
        let Some(content) = self.read_raw().await? else {
            return Ok(None);
        };
        let pid = self.parse(&content)?;
        let liveness = self.probe(pid).await?;
        Ok(Some(Observed {
            content,
            status: RecordStatus::from_probe(pid, liveness),
        }))
    }

    async fn reap_observed(&self, content: &str, pid: Pid) -> PidStoreResult<Option<Pid>> {
        match self.remove_if_unchanged(content).await? {
            Removal::Removed => {
                info!("Reaped stale record {} (process {})", self.path.display(), pid);
                Ok(Some(pid))
            }
            Removal::Gone | Removal::Restored | Removal::Displaced => Ok(None),
        }
    }

    async fn read_raw(&self) -> PidStoreResult<Option<String>> {
        self.files
            .read(&self.path)
            .await
            .map_err(|e| self.io_error(e))
    }

    fn parse(&self, content: &str) -> PidStoreResult<Pid> {
        content
            .parse::<Pid>()
            .map_err(|e| PidStoreError::CorruptRecord {
                path: self.path.clone(),
                reason: e.to_string(),
            })
    }

    async fn probe(&self, pid: Pid) -> PidStoreResult<Liveness> {
        self.control
            .probe(pid)
            .await
            .map_err(|e| self.io_error(e))
    }

    /// Remove the record only if it still holds `expected`.
    async fn remove_if_unchanged(&self, expected: &str) -> PidStoreResult<Removal> {
        let tomb = self.tomb_path();

        let taken = self
            .files
            .take(&self.path, &tomb)
            .await
            .map_err(|e| self.io_error(e))?;
        if !taken {
            return Ok(Removal::Gone);
        }

        let actual = self
            .files
            .read(&tomb)
            .await
            .map_err(|e| PidStoreError::io(&tomb, e))?;

        let removal = match actual {
            Some(actual) if actual != expected => {
                let restored = self
                    .files
                    .restore(&tomb, &self.path)
                    .await
                    .map_err(|e| PidStoreError::io(&tomb, e))?;
                if restored {
                    warn!(
                        "{} was replaced concurrently; put the new record back",
                        self.path.display()
                    );
                    Removal::Restored
                } else {
                    warn!(
                        "{} was replaced twice concurrently; record {:?} could not be put back",
                        self.path.display(),
                        actual.trim()
                    );
                    Removal::Displaced
                }
            }
            _ => Removal::Removed,
        };

        self.discard(&tomb).await;
        Ok(removal)
    }

    async fn discard(&self, tomb: &Path) {
        if let Err(e) = self.files.remove(tomb).await {
            warn!("Failed to remove tombstone {}: {}", tomb.display(), e);
        }
    }

    fn tomb_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map_or_else(|| "record".into(), |n| n.to_string_lossy());
        self.path
            .with_file_name(format!(".{}.{}.reap", name, Uuid::new_v4().simple()))
    }

    fn io_error(&self, source: io::Error) -> PidStoreError {
        PidStoreError::io(&self.path, source)
    }
}
