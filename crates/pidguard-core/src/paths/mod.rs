//! Record path resolution.
//!
//! - Normalizes configured paths to absolute form
//! - Creates the parent directory before a store touches the record
//! - Provides conventional per-user runtime locations
//!
//! OS-specific lookups are kept private in `platform`.

mod error;
mod platform;
mod resolver;

pub use error::PathError;
pub use platform::{RUNTIME_DIR_ENV, default_pid_path, default_runtime_dir};
pub use resolver::{ResolvedRecordPath, normalize_record_path};
