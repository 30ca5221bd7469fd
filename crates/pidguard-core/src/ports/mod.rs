//! Port definitions (trait abstractions) for the filesystem and the OS.
//!
//! # Design Rules
//!
//! - Ports use only domain types and `std::io` errors
//! - No platform-specific code in signatures
//! - Every operation is a single bounded call; retry policy belongs to callers

pub mod process_control;
pub mod record_file;

pub use process_control::{ControlError, ProcessControlPort};
pub use record_file::{ClaimOutcome, RecordFilePort};

#[cfg(test)]
pub use process_control::MockProcessControlPort;
