//! Periodic queue drain and retention cleanup.
//!
//! On every tick the scheduler drains the mutation queue with the session
//! identity (skipped while offline or while another drain is in flight) and
//! then drops queued entries older than the retention window.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use carelog_core::OfflineSyncService;
//! use carelog_infra::scheduling::{SyncScheduler, SyncSchedulerConfig};
//!
//! # async fn example(sync: Arc<OfflineSyncService>) -> carelog_infra::scheduling::SchedulerResult<()> {
//! let mut scheduler = SyncScheduler::new(sync, SyncSchedulerConfig::default());
//! scheduler.start().await?;
//! // ... application runs ...
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use carelog_core::OfflineSyncService;
use carelog_domain::SyncConfig;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Type alias for task handle to avoid complexity warnings
type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Configuration for sync scheduler
#[derive(Debug, Clone)]
pub struct SyncSchedulerConfig {
    /// Time between drains
    pub interval: Duration,
    /// Queued entries older than this are removed after each drain
    pub retention: chrono::Duration,
}

impl Default for SyncSchedulerConfig {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for SyncSchedulerConfig {
    fn from(config: &SyncConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_seconds.max(1)),
            retention: chrono::Duration::days(i64::from(config.retention_days)),
        }
    }
}

/// Sync scheduler for periodic queue drains
pub struct SyncScheduler {
    sync: Arc<OfflineSyncService>,
    config: SyncSchedulerConfig,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl SyncScheduler {
    /// Stopped scheduler that drains `sync` once started.
    pub fn new(sync: Arc<OfflineSyncService>, config: SyncSchedulerConfig) -> Self {
        Self {
            sync,
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Start the scheduler
    ///
    /// Spawns a background task that drains the queue periodically. The
    /// first drain happens one interval after start.
    ///
    /// # Errors
    ///
    /// Returns error if scheduler is already running
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!(interval = ?self.config.interval, "Starting sync scheduler");

        // Fresh token so the scheduler can be restarted after stop
        self.cancellation_token = CancellationToken::new();

        let sync = Arc::clone(&self.sync);
        let config = self.config.clone();
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            Self::sync_loop(sync, config, cancel).await;
        });

        *self.task_handle.lock().await = Some(handle);
        Ok(())
    }

    /// Stop the scheduler gracefully
    ///
    /// Cancels the background task between ticks and awaits completion.
    ///
    /// # Errors
    ///
    /// Returns error if scheduler is not running
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        info!("Stopping sync scheduler");
        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            let join_timeout = Duration::from_secs(5);
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })??;
        }

        info!("Sync scheduler stopped");
        Ok(())
    }

    /// Check if scheduler is running
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    async fn sync_loop(
        sync: Arc<OfflineSyncService>,
        config: SyncSchedulerConfig,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("Sync loop cancelled");
                    break;
                }
                () = tokio::time::sleep(config.interval) => {
                    Self::tick(&sync, &config).await;
                }
            }
        }
    }

    async fn tick(sync: &OfflineSyncService, config: &SyncSchedulerConfig) {
        let started = Instant::now();

        match sync.sync_session().await {
            Some(report) if !report.is_empty() => info!(
                success = report.success,
                failed = report.failed,
                flagged = report.errors.len(),
                "Scheduled drain completed"
            ),
            Some(_) => debug!("Scheduled drain found nothing to do"),
            None => debug!("Scheduled drain skipped, another drain is running"),
        }

        let removed = sync.queue().cleanup_older_than(config.retention).await;
        if removed > 0 {
            warn!(removed, "Dropped queued mutations past retention");
        }

        debug!(elapsed = ?started.elapsed(), "Sync tick finished");
    }
}

/// Ensure scheduler is stopped when dropped
impl Drop for SyncScheduler {
    fn drop(&mut self) {
        if !self.cancellation_token.is_cancelled() {
            self.cancellation_token.cancel();
        }
    }
}
