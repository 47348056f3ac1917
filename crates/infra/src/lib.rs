//! # CareLog Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - File-backed local storage and the application state store built on it
//! - The REST remote backend (reqwest)
//! - The health-probe connectivity monitor
//! - Sync and backup schedulers
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `carelog-core`
//! - Contains all "impure" code (file system, HTTP, timers)

pub mod config;
pub mod errors;
pub mod network;
pub mod remote;
pub mod scheduling;
pub mod state;
pub mod storage;

// Re-export commonly used items
pub use errors::InfraError;
pub use network::{ConnectivityMonitor, ConnectivityMonitorConfig};
pub use remote::{RestBackend, RestBackendConfig};
pub use scheduling::{
    BackupScheduler, BackupSchedulerConfig, SchedulerError, SyncScheduler, SyncSchedulerConfig,
};
pub use state::LocalStateStore;
pub use storage::FileStore;
