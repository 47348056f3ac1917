//! Application constants
//!
//! Storage keys and the limits that govern queue and backup retention.

// Storage keys
pub const QUEUE_STORAGE_KEY: &str = "offline_queue";
pub const BACKUPS_STORAGE_KEY: &str = "backups";
pub const CHECKPOINTS_STORAGE_KEY: &str = "checkpoints";
pub const LAST_SYNC_STORAGE_KEY: &str = "last_sync_time";
pub const STATE_STORAGE_KEY: &str = "app_state";

// Queue
pub const MAX_SYNC_ATTEMPTS: u32 = 3;
pub const DEFAULT_QUEUE_RETENTION_DAYS: u32 = 7;

// Backups and checkpoints
pub const MAX_BACKUPS: usize = 5;
pub const MAX_CHECKPOINTS: usize = 10;
pub const BACKUP_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_BACKUP_INTERVAL_SECS: u64 = 30 * 60;
pub const DEFAULT_CHECKPOINT_INTERVAL_SECS: u64 = 5 * 60;

/// Version stamped into export documents.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
