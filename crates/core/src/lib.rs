//! # CareLog Core
//!
//! Offline-first sync and backup logic with no infrastructure dependencies.
//!
//! This crate contains:
//! - The durable mutation queue, its drain processor and the sync coordinator
//! - The backup and checkpoint service
//! - Port interfaces (traits) for storage, state, network and the remote backend
//!
//! ## Architecture Principles
//! - Only depends on `carelog-common` and `carelog-domain`
//! - No file system, HTTP or platform code
//! - All external dependencies via traits

pub mod backup;
pub mod network;
pub mod storage;
pub mod sync;

// Infrastructure ports
pub mod state_ports;

pub use backup::BackupService;
pub use network::{ManualNetwork, NetworkMonitor};
pub use state_ports::StateStore;
pub use storage::{LocalStore, MemoryStore};
pub use sync::{
    MutationQueue, OfflineSyncService, RemoteBackend, RemoteError, SubmitOutcome, SyncDeps,
    SyncProcessor,
};
