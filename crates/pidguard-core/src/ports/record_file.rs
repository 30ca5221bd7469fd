//! Record file port: the atomic-claim primitive and friends.
//!
//! The protocol in [`PidStore`](crate::PidStore) is written entirely in
//! terms of these operations, so an in-memory implementation can replay
//! cross-process interleavings deterministically.

use std::io;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Outcome of an exclusive create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// The record did not exist and now holds the given content.
    Created,
    /// Something already exists at the path; nothing was written.
    Exists,
}

/// Filesystem operations on record files.
///
/// Implementations must make `create_exclusive`, `take` and `restore`
/// atomic with respect to other processes: each either fully happens or
/// not at all, and a reader never observes partial content at `path`.
#[async_trait]
pub trait RecordFilePort: Send + Sync {
    /// Create `path` holding `content`, only if nothing exists there.
    async fn create_exclusive(&self, path: &Path, content: &str) -> io::Result<ClaimOutcome>;

    /// Read the whole record, `None` if absent.
    async fn read(&self, path: &Path) -> io::Result<Option<String>>;

    /// Move the record at `path` aside to `tomb`.
    ///
    /// Returns `false` if there was nothing at `path`.
    async fn take(&self, path: &Path, tomb: &Path) -> io::Result<bool>;

    /// Put `tomb` back at `path`, only if nothing exists at `path`.
    ///
    /// Returns `false` if `path` is occupied. `tomb` is left in place either
    /// way; the caller removes it.
    async fn restore(&self, tomb: &Path, path: &Path) -> io::Result<bool>;

    /// Remove a file, returning `false` if it was already absent.
    async fn remove(&self, path: &Path) -> io::Result<bool>;

    /// Last modification time, `None` if absent.
    async fn modified(&self, path: &Path) -> io::Result<Option<DateTime<Utc>>>;
}
