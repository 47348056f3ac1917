//! Health-probe based connectivity monitor
//!
//! Polls a health URL on a fixed interval and publishes availability
//! transitions to subscribers. Any 2xx answer counts as online; errors,
//! timeouts and other statuses count as offline.

use std::sync::Arc;
use std::time::Duration;

use carelog_core::{ManualNetwork, NetworkMonitor};
use carelog_domain::{CareLogError, NetworkConfig, Result};
use reqwest::Client;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Configuration for [`ConnectivityMonitor`]
#[derive(Debug, Clone)]
pub struct ConnectivityMonitorConfig {
    pub health_url: String,
    /// Time between probes
    pub interval: Duration,
    /// Per-probe request timeout
    pub probe_timeout: Duration,
    /// Availability assumed before the first probe completes
    pub initially_online: bool,
}

impl From<&NetworkConfig> for ConnectivityMonitorConfig {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            health_url: config.health_url.clone(),
            interval: Duration::from_secs(config.probe_interval_seconds.max(1)),
            probe_timeout: Duration::from_secs(5),
            initially_online: false,
        }
    }
}

/// [`NetworkMonitor`] that probes a health endpoint in the background
pub struct ConnectivityMonitor {
    client: Client,
    config: ConnectivityMonitorConfig,
    state: Arc<ManualNetwork>,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl ConnectivityMonitor {
    /// Stopped monitor probing `config.health_url`.
    ///
    /// # Errors
    /// Returns `CareLogError::Config` when the HTTP client cannot be built.
    pub fn new(config: ConnectivityMonitorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.probe_timeout)
            .build()
            .map_err(|e| CareLogError::Config(format!("Failed to build probe client: {e}")))?;

        Ok(Self {
            client,
            state: Arc::new(ManualNetwork::new(config.initially_online)),
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        })
    }

    /// Shared availability state, usable as a [`NetworkMonitor`] while the
    /// monitor itself is owned elsewhere for start and stop.
    pub fn availability(&self) -> Arc<ManualNetwork> {
        Arc::clone(&self.state)
    }

    /// Probe once and publish the result
    pub async fn probe_now(&self) -> bool {
        probe(&self.client, &self.config.health_url, &self.state).await
    }

    /// Start probing in the background, beginning immediately.
    ///
    /// # Errors
    /// Returns error if the monitor is already running
    #[instrument(skip(self), fields(url = %self.config.health_url))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.cancellation_token = CancellationToken::new();

        let client = self.client.clone();
        let url = self.config.health_url.clone();
        let interval = self.config.interval;
        let state = Arc::clone(&self.state);
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            loop {
                probe(&client, &url, &state).await;
                tokio::select! {
                    () = cancel.cancelled() => {
                        debug!("Connectivity probe loop cancelled");
                        break;
                    }
                    () = tokio::time::sleep(interval) => {}
                }
            }
        });

        *self.task_handle.lock().await = Some(handle);
        info!("Connectivity monitor started");
        Ok(())
    }

    /// Stop probing and wait for the background task.
    ///
    /// # Errors
    /// Returns error if the monitor is not running or the task does not stop
    /// in time
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        self.cancellation_token.cancel();

        if let Some(handle) = self.task_handle.lock().await.take() {
            let join_timeout = Duration::from_secs(5);
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })??;
        }

        info!("Connectivity monitor stopped");
        Ok(())
    }

    /// Whether the probe loop is active
    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|h| !h.is_finished()))
            .unwrap_or(false)
    }
}

impl NetworkMonitor for ConnectivityMonitor {
    fn is_online(&self) -> bool {
        self.state.is_online()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}

impl Drop for ConnectivityMonitor {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}

async fn probe(client: &Client, url: &str, state: &ManualNetwork) -> bool {
    let online = match client.get(url).send().await {
        Ok(response) if response.status().is_success() => true,
        Ok(response) => {
            debug!(status = response.status().as_u16(), "health probe answered unhealthy");
            false
        }
        Err(err) => {
            debug!(error = %err, "health probe failed");
            false
        }
    };

    if state.set_online(online) && !online {
        warn!(url, "backend unreachable, switching to offline mode");
    }
    online
}
