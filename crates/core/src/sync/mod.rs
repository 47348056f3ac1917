//! Offline-first mutation sync
//!
//! - [`queue`]: durable, insertion-ordered queue with attempt bookkeeping
//! - [`processor`]: one drain pass over the queue
//! - [`service`]: routes mutations online or into the queue and drains on
//!   reconnect
//! - [`ports`]: remote backend interface

pub mod errors;
pub mod ports;
pub mod processor;
pub mod queue;
pub mod service;

pub use errors::{RemoteError, RemoteErrorCategory};
pub use ports::{RemoteBackend, RemoteResult};
pub use processor::SyncProcessor;
pub use queue::{DrainGuard, MutationQueue};
pub use service::{OfflineSyncService, SubmitOutcome, SyncDeps};
