//! Domain types and models

pub mod backup;
pub mod queue;

pub use backup::{
    AppState, ChangeCounters, Checkpoint, CheckpointStatus, ExportDocument, ProfileKeyed, Snapshot,
};
pub use queue::{
    EntityKind, EntityRef, Identity, NewOperation, OperationType, Priority, PriorityCount,
    QueueStatus, QueuedOperation, RecoveryInfo, SyncFailure, SyncReport,
};
