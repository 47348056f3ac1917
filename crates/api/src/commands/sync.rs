//! Sync and queue commands
//!
//! Thin wrappers over [`OfflineSyncService`](carelog_core::OfflineSyncService)
//! that act on behalf of the signed-in session.

use carelog_core::SubmitOutcome;
use carelog_domain::{
    Identity, NewOperation, QueueStatus, QueuedOperation, RecoveryInfo, Result as DomainResult,
    SyncReport,
};
use tracing::info;

use crate::context::AppContext;
use crate::utils::command_helpers::execute_command;

/// Set or clear the signed-in identity used by drains and direct writes.
pub async fn set_session(ctx: &AppContext, identity: Option<Identity>) -> DomainResult<()> {
    execute_command("sync::set_session", || async {
        info!(signed_in = identity.is_some(), "session changed");
        ctx.sync.set_session(identity).await;
        Ok(())
    })
    .await
}

/// Apply a mutation for the session user, directly when online and through
/// the queue otherwise.
pub async fn submit_mutation(ctx: &AppContext, op: NewOperation) -> DomainResult<SubmitOutcome> {
    execute_command("sync::submit_mutation", || async {
        let session = ctx.sync.session().await;
        Ok(ctx.sync.submit(session.as_ref(), op).await)
    })
    .await
}

/// Current queue health.
pub async fn get_queue_status(ctx: &AppContext) -> DomainResult<QueueStatus> {
    execute_command("sync::get_queue_status", || async { Ok(ctx.sync.queue_status().await) })
        .await
}

/// Entries that exhausted their attempts and are waiting for user action.
pub async fn get_failed_operations(ctx: &AppContext) -> DomainResult<Vec<QueuedOperation>> {
    execute_command("sync::get_failed_operations", || async {
        Ok(ctx.sync.queue().failed_operations().await)
    })
    .await
}

/// Summary shown after the app restarts or reconnects.
pub async fn get_recovery_info(ctx: &AppContext) -> DomainResult<RecoveryInfo> {
    execute_command("sync::get_recovery_info", || async {
        Ok(RecoveryInfo {
            last_sync_time: ctx.sync.last_sync_time().await,
            queued_items: ctx.sync.queue().len().await,
            backup_count: ctx.backups.backup_count().await,
            is_online: ctx.sync.is_online(),
        })
    })
    .await
}

/// Drain the queue now with the session identity.
///
/// Returns `None` when a drain was already running. Offline or signed out
/// yields an empty report.
pub async fn manual_sync(ctx: &AppContext) -> DomainResult<Option<SyncReport>> {
    execute_command("sync::manual_sync", || async { Ok(ctx.sync.sync_session().await) }).await
}

/// Delete every failed entry. Returns how many were removed.
pub async fn clear_failed_operations(ctx: &AppContext) -> DomainResult<usize> {
    execute_command("sync::clear_failed_operations", || async {
        Ok(ctx.sync.clear_failed_operations().await)
    })
    .await
}

/// Give failed entries a fresh set of attempts. Returns how many were reset.
pub async fn retry_failed_operations(ctx: &AppContext) -> DomainResult<usize> {
    execute_command("sync::retry_failed_operations", || async {
        Ok(ctx.sync.retry_failed_operations().await)
    })
    .await
}
