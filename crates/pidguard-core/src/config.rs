//! Store configuration.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default record path, relative to the working directory.
pub const DEFAULT_PID_FILE: &str = "pid";

/// Environment variable overriding [`PidStoreConfig::path`].
pub const PID_FILE_ENV: &str = "PIDGUARD_PID_FILE";

/// Environment variable overriding [`PidStoreConfig::reap_stale`].
pub const REAP_STALE_ENV: &str = "PIDGUARD_REAP_STALE";

/// Configuration for one process record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidStoreConfig {
    /// Record location. Relative paths resolve against the working directory.
    pub path: PathBuf,

    /// Delete stale records when `running()` observes them.
    ///
    /// Off by default: deleting a record is a consequential act that
    /// belongs to the caller.
    pub reap_stale: bool,
}

impl Default for PidStoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_PID_FILE),
            reap_stale: false,
        }
    }
}

impl PidStoreConfig {
    /// Config for an explicit path with default options.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_reap_stale(mut self, reap_stale: bool) -> Self {
        self.reap_stale = reap_stale;
        self
    }

    /// Defaults overridden by `PIDGUARD_PID_FILE` and `PIDGUARD_REAP_STALE`.
    pub fn from_env() -> Self {
        Self::default().overlay(|key| env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (environment, dotenv map, …).
    #[must_use]
    pub fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = lookup(PID_FILE_ENV).filter(|v| !v.trim().is_empty()) {
            self.path = PathBuf::from(path.trim());
        }
        if let Some(flag) = lookup(REAP_STALE_ENV).and_then(|v| parse_flag(&v)) {
            self.reap_stale = flag;
        }
        self
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
