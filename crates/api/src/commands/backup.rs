//! Backup, checkpoint and export commands

use carelog_domain::{Checkpoint, CheckpointStatus, Result as DomainResult, Snapshot};

use crate::context::AppContext;
use crate::utils::command_helpers::execute_command;

/// Take a snapshot of local state now and mirror it remotely when signed in.
pub async fn create_backup(ctx: &AppContext) -> DomainResult<Snapshot> {
    execute_command("backup::create_backup", || async {
        let session = ctx.sync.session().await;
        ctx.backups.create_backup(session.as_ref()).await
    })
    .await
}

/// Retained snapshots, oldest first.
pub async fn list_backups(ctx: &AppContext) -> DomainResult<Vec<Snapshot>> {
    execute_command("backup::list_backups", || async { Ok(ctx.backups.list_backups().await) })
        .await
}

/// Replace local state with the newest snapshot.
pub async fn restore_latest_backup(ctx: &AppContext) -> DomainResult<Snapshot> {
    execute_command("backup::restore_latest_backup", || async {
        ctx.backups.restore_latest().await
    })
    .await
}

/// Record a checkpoint whose status reflects the current queue.
pub async fn create_checkpoint(ctx: &AppContext) -> DomainResult<Checkpoint> {
    execute_command("backup::create_checkpoint", || async {
        let status = CheckpointStatus::from_queue(&ctx.sync.queue_status().await);
        ctx.backups.create_checkpoint(status).await
    })
    .await
}

/// Whether local state changed since the last checkpoint.
pub async fn has_state_drifted(ctx: &AppContext) -> DomainResult<bool> {
    execute_command("backup::has_state_drifted", || async { ctx.backups.has_drifted().await })
        .await
}

/// Pretty-printed JSON export of every collection and the settings.
pub async fn export_data(ctx: &AppContext) -> DomainResult<String> {
    execute_command("backup::export_data", || async { ctx.backups.export_json().await }).await
}

/// Replace local state with an exported document.
///
/// A safety backup is taken first; the import is refused when the document
/// does not parse or the safety backup fails.
pub async fn import_data(ctx: &AppContext, json: &str) -> DomainResult<()> {
    execute_command("backup::import_data", || async { ctx.backups.import_data(json).await }).await
}
