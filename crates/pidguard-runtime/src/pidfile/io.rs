//! Atomic record file I/O on the local filesystem.
//!
//! # Exclusive create
//! 1. Write the content to `.<name>.<uuid>.tmp` and sync it
//! 2. Hard-link the temp file to `<name>` (fails if `<name>` exists)
//! 3. Remove the temp file
//!
//! A record therefore appears at its path fully written or not at all.
//! Filesystems without hard links fall back to `O_CREAT | O_EXCL`.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::warn;
use uuid::Uuid;

use pidguard_core::{ClaimOutcome, RecordFilePort};

/// [`RecordFilePort`] backed by `tokio::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsRecordFile;

impl FsRecordFile {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RecordFilePort for FsRecordFile {
    async fn create_exclusive(&self, path: &Path, content: &str) -> io::Result<ClaimOutcome> {
        let temp = sibling(path, "tmp");
        write_new(&temp, content.as_bytes()).await?;

        let linked = fs::hard_link(&temp, path).await;
        remove_quietly(&temp).await;

        match linked {
            Ok(()) => Ok(ClaimOutcome::Created),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(ClaimOutcome::Exists),
            Err(e) if links_unsupported(&e) => {
                warn!(
                    "Hard links unavailable for {} ({}), falling back to non-atomic exclusive open",
                    path.display(),
                    e
                );
                create_direct(path, content.as_bytes()).await
            }
            Err(e) => Err(e),
        }
    }

    async fn read(&self, path: &Path) -> io::Result<Option<String>> {
        match fs::read(path).await {
            // Non-UTF-8 bytes surface as a corrupt record, not an I/O failure
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn take(&self, path: &Path, tomb: &Path) -> io::Result<bool> {
        match fs::rename(path, tomb).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn restore(&self, tomb: &Path, path: &Path) -> io::Result<bool> {
        match fs::hard_link(tomb, path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) if links_unsupported(&e) => {
                let content = fs::read(tomb).await?;
                Ok(create_direct(path, &content).await? == ClaimOutcome::Created)
            }
            Err(e) => Err(e),
        }
    }

    async fn remove(&self, path: &Path) -> io::Result<bool> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn modified(&self, path: &Path) -> io::Result<Option<DateTime<Utc>>> {
        match fs::metadata(path).await {
            Ok(meta) => Ok(Some(DateTime::<Utc>::from(meta.modified()?))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Hidden, uniquely named sibling of `path` (same directory, so links and
/// renames stay on one filesystem).
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "record".into(), |n| n.to_string_lossy());
    path.with_file_name(format!(".{}.{}.{}", name, Uuid::new_v4().simple(), suffix))
}

async fn write_new(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(content).await?;
    file.sync_all().await
}

/// Exclusive open of the record itself. Readers may briefly see it empty.
async fn create_direct(path: &Path, content: &[u8]) -> io::Result<ClaimOutcome> {
    match write_new(path, content).await {
        Ok(()) => Ok(ClaimOutcome::Created),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(ClaimOutcome::Exists),
        Err(e) => Err(e),
    }
}

/// Only an explicit "not supported" answer downgrades to the exclusive open;
/// permission failures surface as errors.
fn links_unsupported(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::Unsupported
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            warn!("Failed to remove temporary file {}: {}", path.display(), e);
        }
    }
}
