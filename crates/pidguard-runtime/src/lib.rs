//! # pidguard-runtime
//!
//! Local adapters for `pidguard-core`: [`FsRecordFile`] implements the
//! record file primitives on `tokio::fs`, and [`OsProcessControl`] probes
//! and signals processes through the operating system.
//!
//! ```no_run
//! # async fn demo() -> pidguard_core::PidStoreResult<()> {
//! use pidguard_core::{PidStoreConfig, SignalKind};
//!
//! let store = pidguard_runtime::open_store(&PidStoreConfig::new("/run/app/app.pid")).await?;
//! if store.running().await? {
//!     store.kill(SignalKind::Term).await?;
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

mod bootstrap;
pub mod pidfile;
pub mod process;

pub use bootstrap::{current_pid, open_store, open_store_from_env, sweep_directory};
pub use pidfile::{FsRecordFile, SweepReport, sweep_stale_records};
pub use process::OsProcessControl;
