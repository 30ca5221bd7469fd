//! Platform-specific default locations for record files.

use std::env;
use std::path::PathBuf;

use super::error::PathError;

/// Environment variable overriding the runtime directory.
pub const RUNTIME_DIR_ENV: &str = "PIDGUARD_RUNTIME_DIR";

/// Get the directory where an application should keep its record files.
///
/// Resolution order:
/// 1. `PIDGUARD_RUNTIME_DIR` environment variable (highest priority)
/// 2. `$XDG_RUNTIME_DIR/<app>` (per-user tmpfs on most Linux systems)
/// 3. Local data directory (e.g. `~/.local/share/<app>/run`)
///
/// The directory is not created here; opening a store creates it.
pub fn default_runtime_dir(app: &str) -> Result<PathBuf, PathError> {
    runtime_dir_from(app, |key| env::var(key).ok(), dirs::data_local_dir)
}

pub(crate) fn runtime_dir_from(
    app: &str,
    lookup: impl Fn(&str) -> Option<String>,
    data_dir: impl FnOnce() -> Option<PathBuf>,
) -> Result<PathBuf, PathError> {
    if let Some(dir) = lookup(RUNTIME_DIR_ENV).filter(|v| !v.trim().is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    if let Some(dir) = lookup("XDG_RUNTIME_DIR").filter(|v| !v.trim().is_empty()) {
        return Ok(PathBuf::from(dir).join(app));
    }

    let data = data_dir().ok_or(PathError::NoRuntimeDir)?;
    Ok(data.join(app).join("run"))
}

/// Conventional record path for `app`: `<runtime dir>/<app>.pid`.
pub fn default_pid_path(app: &str) -> Result<PathBuf, PathError> {
    Ok(default_runtime_dir(app)?.join(format!("{app}.pid")))
}
