//! Scheduling infrastructure for background work
//!
//! - Sync scheduler: periodic queue drain plus retention cleanup
//! - Backup scheduler: independent snapshot and checkpoint timers
//!
//! All schedulers follow the same runtime rules:
//! - Explicit lifecycle management (start/stop)
//! - Join handles for spawned tasks
//! - Cancellation token support, honoured between ticks only
//! - Timeout wrapping when joining on stop

pub mod backup_scheduler;
pub mod error;
pub mod sync_scheduler;

#[cfg(test)]
mod test_support;

pub use backup_scheduler::{BackupScheduler, BackupSchedulerConfig};
pub use error::{SchedulerError, SchedulerResult};
pub use sync_scheduler::{SyncScheduler, SyncSchedulerConfig};
