//! Record path normalization and parent directory preparation.

use std::env;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use super::error::PathError;

/// An absolute record path whose parent directory is known to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRecordPath {
    path: PathBuf,
}

impl ResolvedRecordPath {
    /// Normalize `raw` and create its parent directory if missing.
    ///
    /// Relative paths are joined to the current working directory, `~`
    /// expands to the home directory.
    pub async fn resolve(raw: &Path) -> Result<Self, PathError> {
        let path = normalize_record_path(raw)?;
        let parent = path
            .parent()
            .ok_or_else(|| PathError::NoFileName(path.clone()))?;
        ensure_parent_dir(parent).await?;
        Ok(Self { path })
    }

    pub fn as_path(&self) -> &Path {
        &self.path
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.path
    }
}

impl AsRef<Path> for ResolvedRecordPath {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

/// Normalize a configured record path to an absolute, lexically clean path.
///
/// Does not touch the filesystem and does not follow symlinks.
pub fn normalize_record_path(raw: &Path) -> Result<PathBuf, PathError> {
    let text = raw.to_string_lossy();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(PathError::EmptyPath);
    }

    let expanded = if trimmed == "~" || trimmed.starts_with("~/") {
        let home = dirs::home_dir().ok_or(PathError::NoHomeDir)?;
        home.join(trimmed.trim_start_matches('~').trim_start_matches('/'))
    } else {
        raw.to_path_buf()
    };

    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .map_err(|e| PathError::CurrentDirError(e.to_string()))?
    };

    let cleaned = clean(&absolute);
    if cleaned.file_name().is_none() {
        return Err(PathError::NoFileName(raw.to_path_buf()));
    }
    Ok(cleaned)
}

/// Drop `.` components and fold `..` into its parent.
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

async fn ensure_parent_dir(parent: &Path) -> Result<(), PathError> {
    match tokio::fs::metadata(parent).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(PathError::NotADirectory(parent.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("Creating record directory {}", parent.display());
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PathError::CreateFailed {
                    path: parent.to_path_buf(),
                    reason: e.to_string(),
                })
        }
        Err(e) => Err(PathError::CreateFailed {
            path: parent.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}
