//! Application context - dependency injection container

use std::path::PathBuf;
use std::sync::Arc;

use carelog_common::testing::{Clock, SystemClock};
use carelog_core::{
    BackupService, LocalStore, MutationQueue, NetworkMonitor, OfflineSyncService, RemoteBackend,
    StateStore, SyncDeps,
};
use carelog_domain::{CareLogError, Config, Result};
use carelog_infra::{
    BackupScheduler, BackupSchedulerConfig, ConnectivityMonitor, ConnectivityMonitorConfig,
    FileStore, LocalStateStore, RestBackend, RestBackendConfig, SyncScheduler,
    SyncSchedulerConfig,
};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Collaborators a context is assembled from
pub struct AppParts {
    pub config: Config,
    pub store: Arc<dyn LocalStore>,
    pub backend: Arc<dyn RemoteBackend>,
    pub network: Arc<dyn NetworkMonitor>,
    pub clock: Arc<dyn Clock>,
}

/// Background work owned by the context
#[derive(Default)]
struct BackgroundTasks {
    sync_scheduler: Option<SyncScheduler>,
    backup_scheduler: Option<BackupScheduler>,
    connectivity: Option<ConnectivityMonitor>,
    listener: Option<(CancellationToken, JoinHandle<()>)>,
}

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub store: Arc<dyn LocalStore>,
    pub state: Arc<dyn StateStore>,
    pub network: Arc<dyn NetworkMonitor>,
    pub sync: Arc<OfflineSyncService>,
    pub backups: Arc<BackupService>,
    background: Mutex<BackgroundTasks>,
}

impl AppContext {
    /// Build the production context: file store under `storage.data_dir`,
    /// REST backend, and a health-probe connectivity monitor.
    ///
    /// # Errors
    /// Fails when the data directory cannot be created or an HTTP client
    /// cannot be built.
    pub async fn new(config: Config) -> Result<Self> {
        let store: Arc<dyn LocalStore> =
            Arc::new(FileStore::open(PathBuf::from(&config.storage.data_dir)).await?);
        let backend: Arc<dyn RemoteBackend> =
            Arc::new(RestBackend::new(RestBackendConfig::from(&config.remote))?);
        let monitor = ConnectivityMonitor::new(ConnectivityMonitorConfig::from(&config.network))?;
        let network: Arc<dyn NetworkMonitor> = monitor.availability();

        let mut context = Self::from_parts(AppParts {
            config,
            store,
            backend,
            network,
            clock: Arc::new(SystemClock),
        })
        .await;
        context.background.get_mut().connectivity = Some(monitor);
        Ok(context)
    }

    /// Assemble a context from explicit collaborators.
    ///
    /// The persisted queue is loaded from `parts.store`.
    pub async fn from_parts(parts: AppParts) -> Self {
        let AppParts { config, store, backend, network, clock } = parts;

        let queue = Arc::new(
            MutationQueue::load(Arc::clone(&store), Arc::clone(&clock))
                .await
                .with_max_attempts(config.sync.max_attempts),
        );
        let sync = Arc::new(OfflineSyncService::new(SyncDeps {
            queue,
            backend: Arc::clone(&backend),
            network: Arc::clone(&network),
            store: Arc::clone(&store),
            clock: Arc::clone(&clock),
        }));

        let state: Arc<dyn StateStore> = Arc::new(LocalStateStore::new(Arc::clone(&store)));
        let backups = Arc::new(
            BackupService::new(Arc::clone(&state), Arc::clone(&store), backend, clock)
                .with_retention(config.backup.retained_snapshots, config.backup.retained_checkpoints),
        );

        Self {
            config,
            store,
            state,
            network,
            sync,
            backups,
            background: Mutex::new(BackgroundTasks::default()),
        }
    }

    /// Start the enabled schedulers, the connectivity monitor and the
    /// reconnect listener.
    ///
    /// Either everything starts or nothing is left running, so a failed
    /// call can be retried.
    ///
    /// # Errors
    /// Fails when background work is already running or a component does
    /// not start.
    pub async fn start_background(&self) -> Result<()> {
        let mut tasks = self.background.lock().await;
        if tasks.listener.is_some() {
            return Err(CareLogError::Validation("background tasks already running".into()));
        }

        if let Err(err) = self.start_components(&mut tasks).await {
            warn!(error = %err, "background start failed, stopping what already started");
            stop_tasks(&mut tasks).await;
            return Err(err);
        }

        // Listener goes last; its presence marks a completed start.
        let cancel = CancellationToken::new();
        let listener = self.sync.spawn_connectivity_listener(cancel.clone());
        tasks.listener = Some((cancel, listener));

        info!(
            sync_enabled = self.config.sync.enabled,
            backup_enabled = self.config.backup.enabled,
            "background tasks started"
        );
        Ok(())
    }

    async fn start_components(&self, tasks: &mut BackgroundTasks) -> Result<()> {
        if self.config.sync.enabled {
            let mut scheduler = SyncScheduler::new(
                Arc::clone(&self.sync),
                SyncSchedulerConfig::from(&self.config.sync),
            );
            scheduler.start().await?;
            tasks.sync_scheduler = Some(scheduler);
        }

        if self.config.backup.enabled {
            let mut scheduler = BackupScheduler::new(
                Arc::clone(&self.backups),
                Arc::clone(&self.sync),
                BackupSchedulerConfig::from(&self.config.backup),
            );
            scheduler.start().await?;
            tasks.backup_scheduler = Some(scheduler);
        }

        if let Some(monitor) = tasks.connectivity.as_mut() {
            monitor.start().await?;
        }
        Ok(())
    }

    /// Stop everything `start_background` started. Calling it again is a
    /// no-op.
    pub async fn shutdown(&self) {
        let mut tasks = self.background.lock().await;
        stop_tasks(&mut tasks).await;
        info!("background tasks stopped");
    }
}

async fn stop_tasks(tasks: &mut BackgroundTasks) {
    if let Some(mut scheduler) = tasks.sync_scheduler.take() {
        if let Err(err) = scheduler.stop().await {
            warn!(error = %err, "sync scheduler did not stop cleanly");
        }
    }
    if let Some(mut scheduler) = tasks.backup_scheduler.take() {
        if let Err(err) = scheduler.stop().await {
            warn!(error = %err, "backup scheduler did not stop cleanly");
        }
    }
    if let Some(monitor) = tasks.connectivity.as_mut().filter(|m| m.is_running()) {
        if let Err(err) = monitor.stop().await {
            warn!(error = %err, "connectivity monitor did not stop cleanly");
        }
    }
    if let Some((cancel, handle)) = tasks.listener.take() {
        cancel.cancel();
        if let Err(err) = handle.await {
            warn!(error = %err, "connectivity listener did not stop cleanly");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use carelog_common::testing::MockClock;
    use carelog_core::{ManualNetwork, MemoryStore};

    use super::*;

    async fn context_with_monitor() -> AppContext {
        let backend = RestBackend::new(RestBackendConfig {
            base_url: "http://127.0.0.1:9".into(),
            timeout: Duration::from_millis(200),
        })
        .unwrap();
        let monitor = ConnectivityMonitor::new(ConnectivityMonitorConfig {
            health_url: "http://127.0.0.1:9/health".into(),
            interval: Duration::from_secs(60),
            probe_timeout: Duration::from_millis(200),
            initially_online: false,
        })
        .unwrap();

        let mut ctx = AppContext::from_parts(AppParts {
            config: Config::default(),
            store: Arc::new(MemoryStore::new()),
            backend: Arc::new(backend),
            network: Arc::new(ManualNetwork::new(false)),
            clock: Arc::new(MockClock::new()),
        })
        .await;
        ctx.background.get_mut().connectivity = Some(monitor);
        ctx
    }

    /// Validates that a failed start leaves nothing behind.
    ///
    /// Assertions:
    /// - A monitor that refuses to start fails the whole call.
    /// - No listener or scheduler stays registered afterwards.
    /// - Once the cause is gone, a second call starts everything.
    #[tokio::test]
    async fn test_failed_start_can_be_retried() {
        let ctx = context_with_monitor().await;
        assert!(ctx.config.sync.enabled && ctx.config.backup.enabled);

        // A monitor that is already probing refuses a second start.
        let mut tasks = ctx.background.lock().await;
        tasks.connectivity.as_mut().unwrap().start().await.unwrap();
        drop(tasks);

        assert!(ctx.start_background().await.is_err());
        {
            let tasks = ctx.background.lock().await;
            assert!(tasks.listener.is_none());
            assert!(tasks.sync_scheduler.is_none());
            assert!(tasks.backup_scheduler.is_none());
        }

        ctx.background.lock().await.connectivity.as_mut().unwrap().stop().await.unwrap();

        ctx.start_background().await.unwrap();
        {
            let tasks = ctx.background.lock().await;
            assert!(tasks.listener.is_some());
            assert!(tasks.sync_scheduler.as_ref().is_some_and(SyncScheduler::is_running));
            assert!(tasks.connectivity.as_ref().is_some_and(ConnectivityMonitor::is_running));
        }

        ctx.shutdown().await;
        assert!(ctx.background.lock().await.listener.is_none());
    }
}
