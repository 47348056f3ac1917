//! Backup and checkpoint safety net
//!
//! Runs independently of the mutation queue. Snapshots carry the whole state
//! and are retained newest-last; checkpoints only carry a content hash and
//! record counts for drift detection.

pub mod service;

pub use service::{content_hash, BackupService};
