//! # pidguard-core
//!
//! Domain types, ports and the record protocol for advertising a
//! long-running process through a PID file.
//!
//! A [`PidStore`] is bound to one record path. The owning process claims the
//! path with [`PidStore::write`] and clears it with [`PidStore::delete`] or
//! [`PidStore::release`]; unrelated processes ask [`PidStore::running`] or
//! signal the owner with [`PidStore::kill`]. Processes never coordinate
//! except through the record file itself.
//!
//! This crate performs no OS calls of its own: the filesystem primitives
//! live behind [`RecordFilePort`] and process probing/signalling behind
//! [`ProcessControlPort`]. `pidguard-runtime` provides the real adapters.

#![deny(unused_crate_dependencies)]

pub mod config;
pub mod domain;
pub mod error;
pub mod paths;
pub mod ports;
pub mod services;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use config::PidStoreConfig;
pub use domain::{
    Liveness, MAX_PID, Pid, PidParseError, ProcessDetails, RecordSnapshot, RecordStatus,
    SignalKind,
};
pub use error::{PidStoreError, PidStoreResult};
pub use paths::{PathError, ResolvedRecordPath, default_pid_path, default_runtime_dir};
pub use ports::{ClaimOutcome, ControlError, ProcessControlPort, RecordFilePort};
pub use services::{MAX_CLAIM_ATTEMPTS, PidStore};
