//! Application commands
//!
//! Each command takes the shared [`AppContext`](crate::AppContext), runs
//! through the command helper for timing and logging, and returns a domain
//! `Result`.

pub mod backup;
pub mod sync;

pub use backup::{
    create_backup, create_checkpoint, export_data, has_state_drifted, import_data, list_backups,
    restore_latest_backup,
};
pub use sync::{
    clear_failed_operations, get_failed_operations, get_queue_status, get_recovery_info,
    manual_sync, retry_failed_operations, set_session, submit_mutation,
};
