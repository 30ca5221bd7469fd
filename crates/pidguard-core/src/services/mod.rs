//! Services built on the ports.

mod pid_store;

pub use pid_store::{MAX_CLAIM_ATTEMPTS, PidStore};
