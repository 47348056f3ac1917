//! Independent backup and checkpoint timers.
//!
//! Two loops share one cancellation token: one takes full snapshots (mirrored
//! remotely when a session identity is set), the other records checkpoints
//! whose status reflects the mutation queue at that moment. Neither waits for
//! or blocks queue drains.

use std::sync::Arc;
use std::time::Duration;

use carelog_core::{BackupService, OfflineSyncService};
use carelog_domain::{BackupConfig, CheckpointStatus};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

type TaskHandles = Arc<Mutex<Vec<JoinHandle<()>>>>;

/// Configuration for backup scheduler
#[derive(Debug, Clone)]
pub struct BackupSchedulerConfig {
    pub backup_interval: Duration,
    pub checkpoint_interval: Duration,
}

impl Default for BackupSchedulerConfig {
    fn default() -> Self {
        Self::from(&BackupConfig::default())
    }
}

impl From<&BackupConfig> for BackupSchedulerConfig {
    fn from(config: &BackupConfig) -> Self {
        Self {
            backup_interval: Duration::from_secs(config.interval_seconds.max(1)),
            checkpoint_interval: Duration::from_secs(config.checkpoint_interval_seconds.max(1)),
        }
    }
}

/// Runs the snapshot and checkpoint timers
pub struct BackupScheduler {
    backups: Arc<BackupService>,
    sync: Arc<OfflineSyncService>,
    config: BackupSchedulerConfig,
    cancellation_token: CancellationToken,
    task_handles: TaskHandles,
}

impl BackupScheduler {
    /// Scheduler over `backups`; `sync` supplies the queue status for checkpoints.
    pub fn new(
        backups: Arc<BackupService>,
        sync: Arc<OfflineSyncService>,
        config: BackupSchedulerConfig,
    ) -> Self {
        Self {
            backups,
            sync,
            config,
            cancellation_token: CancellationToken::new(),
            task_handles: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Start both timers. Each fires first one interval after start.
    ///
    /// # Errors
    ///
    /// Returns error if scheduler is already running
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!(
            backup_interval = ?self.config.backup_interval,
            checkpoint_interval = ?self.config.checkpoint_interval,
            "Starting backup scheduler"
        );
        self.cancellation_token = CancellationToken::new();

        let backup_task = {
            let backups = Arc::clone(&self.backups);
            let sync = Arc::clone(&self.sync);
            let interval = self.config.backup_interval;
            let cancel = self.cancellation_token.clone();
            tokio::spawn(async move {
                while Self::wait_tick(&cancel, interval).await {
                    Self::backup_tick(&backups, &sync).await;
                }
                debug!("Backup loop cancelled");
            })
        };

        let checkpoint_task = {
            let backups = Arc::clone(&self.backups);
            let sync = Arc::clone(&self.sync);
            let interval = self.config.checkpoint_interval;
            let cancel = self.cancellation_token.clone();
            tokio::spawn(async move {
                while Self::wait_tick(&cancel, interval).await {
                    Self::checkpoint_tick(&backups, &sync).await;
                }
                debug!("Checkpoint loop cancelled");
            })
        };

        *self.task_handles.lock().await = vec![backup_task, checkpoint_task];
        Ok(())
    }

    /// Stop both timers and await their tasks.
    ///
    /// # Errors
    ///
    /// Returns error if scheduler is not running or a task does not stop in
    /// time
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        info!("Stopping backup scheduler");
        self.cancellation_token.cancel();

        let handles = std::mem::take(&mut *self.task_handles.lock().await);
        let join_timeout = Duration::from_secs(5);
        for handle in handles {
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })??;
        }

        info!("Backup scheduler stopped");
        Ok(())
    }

    /// Running while any timer task is alive
    pub fn is_running(&self) -> bool {
        self.task_handles
            .try_lock()
            .map(|handles| handles.iter().any(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Sleep one interval; false once cancelled.
    async fn wait_tick(cancel: &CancellationToken, interval: Duration) -> bool {
        tokio::select! {
            () = cancel.cancelled() => false,
            () = tokio::time::sleep(interval) => true,
        }
    }

    async fn backup_tick(backups: &BackupService, sync: &OfflineSyncService) {
        let identity = sync.session().await;
        match backups.create_backup(identity.as_ref()).await {
            Ok(snapshot) => debug!(snapshot_id = %snapshot.id, "Scheduled backup created"),
            Err(err) => error!(error = %err, "Scheduled backup failed"),
        }
    }

    async fn checkpoint_tick(backups: &BackupService, sync: &OfflineSyncService) {
        let status = CheckpointStatus::from_queue(&sync.queue_status().await);
        if let Err(err) = backups.create_checkpoint(status).await {
            error!(error = %err, "Scheduled checkpoint failed");
        }
    }
}

impl Drop for BackupScheduler {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use carelog_core::{LocalStore, MemoryStore, StateStore};
    use carelog_domain::{EntityKind, Identity, NewOperation, OperationType};

    use super::*;
    use crate::scheduling::test_support::recording_sync;
    use crate::state::LocalStateStore;

    async fn scheduler(
        online: bool,
    ) -> (BackupScheduler, Arc<BackupService>, Arc<OfflineSyncService>) {
        let (sync, backend, clock) = recording_sync(online).await;
        let store: Arc<dyn LocalStore> = Arc::new(MemoryStore::new());
        let state: Arc<dyn StateStore> = Arc::new(LocalStateStore::new(Arc::clone(&store)));
        let backups = Arc::new(BackupService::new(state, store, backend, clock));
        let scheduler = BackupScheduler::new(
            Arc::clone(&backups),
            Arc::clone(&sync),
            BackupSchedulerConfig {
                backup_interval: Duration::from_secs(1800),
                checkpoint_interval: Duration::from_secs(300),
            },
        );
        (scheduler, backups, sync)
    }

    #[tokio::test]
    async fn test_scheduler_lifecycle() {
        let (mut scheduler, _, _) = scheduler(false).await;

        scheduler.start().await.unwrap();
        assert!(scheduler.is_running());
        assert!(matches!(scheduler.start().await, Err(SchedulerError::AlreadyRunning)));

        scheduler.stop().await.unwrap();
        assert!(!scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timers_fire_independently() {
        let (mut scheduler, backups, _) = scheduler(false).await;
        scheduler.start().await.unwrap();

        tokio::time::sleep(Duration::from_secs(301)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(backups.list_checkpoints().await.len(), 1);
        assert_eq!(backups.backup_count().await, 0);

        tokio::time::sleep(Duration::from_secs(1500)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(backups.list_checkpoints().await.len(), 6);
        assert_eq!(backups.backup_count().await, 1);

        scheduler.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_checkpoint_tick_reflects_queue() {
        let (_scheduler, backups, sync) = scheduler(false).await;
        sync.submit(None, NewOperation::new(OperationType::Add, EntityKind::Log, "l1")).await;

        BackupScheduler::checkpoint_tick(&backups, &sync).await;
        let checkpoint = backups.latest_checkpoint().await.unwrap();
        assert_eq!(checkpoint.status, CheckpointStatus::Pending);
    }

    #[tokio::test]
    async fn test_backup_tick_mirrors_with_session() {
        let (sync, backend, clock) = recording_sync(true).await;
        let store: Arc<dyn LocalStore> = Arc::new(MemoryStore::new());
        let state: Arc<dyn StateStore> = Arc::new(LocalStateStore::new(Arc::clone(&store)));
        let backups = BackupService::new(state, store, backend.clone(), clock);

        BackupScheduler::backup_tick(&backups, &sync).await;
        assert_eq!(backend.backups(), 0);

        sync.set_session(Some(Identity::new("u1"))).await;
        BackupScheduler::backup_tick(&backups, &sync).await;
        assert_eq!(backend.backups(), 1);
        assert_eq!(backups.backup_count().await, 2);
    }
}
