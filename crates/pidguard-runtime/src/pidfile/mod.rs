//! PID record files on the local filesystem.
//!
//! Provides the atomic file primitives behind [`pidguard_core::PidStore`]
//! and a directory sweep for records left behind by crashed processes.
//!
//! # Safety guarantees
//! - Records appear fully written or not at all (temp file + hard link)
//! - Stale records are removed by compare-and-remove, never blindly
//! - Corrupt records are reported, not deleted, by the sweep

mod io;
mod sweep;

pub use io::FsRecordFile;
pub use sweep::{RECORD_EXTENSION, SweepReport, sweep_stale_records};
