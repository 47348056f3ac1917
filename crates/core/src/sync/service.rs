//! Offline-first sync coordinator
//!
//! Routes each mutation either straight to the remote backend (online, with
//! bounded retries) or into the durable queue (offline, or after a failed
//! direct write). Listens for connectivity changes and drains the queue on
//! every offline to online transition.

use std::sync::Arc;

use carelog_common::resilience::{with_retry, RetryOptions};
use carelog_common::testing::Clock;
use carelog_domain::constants::LAST_SYNC_STORAGE_KEY;
use carelog_domain::{Identity, NewOperation, OperationType, QueueStatus, SyncReport};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::errors::RemoteError;
use super::ports::RemoteBackend;
use super::processor::SyncProcessor;
use super::queue::MutationQueue;
use crate::network::NetworkMonitor;
use crate::storage::{load_json, save_json, LocalStore};

/// Where a submitted mutation ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Written to the remote backend directly
    Synced,
    /// Stored in the queue for a later drain
    Queued(Uuid),
}

/// Collaborators of [`OfflineSyncService`]
pub struct SyncDeps {
    pub queue: Arc<MutationQueue>,
    pub backend: Arc<dyn RemoteBackend>,
    pub network: Arc<dyn NetworkMonitor>,
    pub store: Arc<dyn LocalStore>,
    pub clock: Arc<dyn Clock>,
}

/// Coordinates direct writes, queueing and reconnect drains
pub struct OfflineSyncService {
    queue: Arc<MutationQueue>,
    processor: SyncProcessor,
    backend: Arc<dyn RemoteBackend>,
    network: Arc<dyn NetworkMonitor>,
    store: Arc<dyn LocalStore>,
    clock: Arc<dyn Clock>,
    session: RwLock<Option<Identity>>,
    retry: RetryOptions<RemoteError>,
}

impl OfflineSyncService {
    /// Create a coordinator with default retry options
    pub fn new(deps: SyncDeps) -> Self {
        let processor = SyncProcessor::new(Arc::clone(&deps.queue), Arc::clone(&deps.backend));
        Self {
            queue: deps.queue,
            processor,
            backend: deps.backend,
            network: deps.network,
            store: deps.store,
            clock: deps.clock,
            session: RwLock::new(None),
            retry: RetryOptions::default(),
        }
    }

    /// Replace the retry options used for direct writes
    #[must_use]
    pub fn with_retry_options(mut self, retry: RetryOptions<RemoteError>) -> Self {
        self.retry = retry;
        self
    }

    /// Queue owned by this coordinator
    pub fn queue(&self) -> &Arc<MutationQueue> {
        &self.queue
    }

    /// Set or clear the identity used by timer and reconnect drains
    pub async fn set_session(&self, identity: Option<Identity>) {
        *self.session.write().await = identity;
    }

    /// Identity used by timer and reconnect drains
    pub async fn session(&self) -> Option<Identity> {
        self.session.read().await.clone()
    }

    /// Current network availability
    pub fn is_online(&self) -> bool {
        self.network.is_online()
    }

    /// Apply a mutation, remotely if possible and through the queue otherwise.
    ///
    /// Never fails: any direct-write failure, fatal or not, falls back to the
    /// queue.
    #[instrument(skip(self, identity, op), fields(entity = %op.entity, op_type = %op.op_type))]
    pub async fn submit(&self, identity: Option<&Identity>, op: NewOperation) -> SubmitOutcome {
        let Some(identity) = identity.filter(|_| self.network.is_online()) else {
            debug!("offline or signed out, queueing mutation");
            return SubmitOutcome::Queued(self.queue.enqueue(op).await);
        };

        match self.write_direct(identity, &op).await {
            Ok(()) => {
                self.mark_synced().await;
                SubmitOutcome::Synced
            }
            Err(err) => {
                warn!(error = %err, "direct write failed, queueing mutation");
                SubmitOutcome::Queued(self.queue.enqueue(op).await)
            }
        }
    }

    async fn write_direct(&self, identity: &Identity, op: &NewOperation) -> Result<(), RemoteError> {
        let target = &op.entity_ref();
        let backend = &self.backend;
        with_retry(
            || async move {
                match op.op_type {
                    OperationType::Add => backend.add(identity, target, &op.payload).await,
                    OperationType::Update => backend.update(identity, target, &op.payload).await,
                    OperationType::Delete => backend.delete(identity, target).await,
                }
            },
            self.retry.clone(),
        )
        .await
    }

    /// Drain now with an explicit identity.
    ///
    /// Returns `None` when a drain was already in flight.
    pub async fn manual_sync(&self, identity: Option<&Identity>) -> Option<SyncReport> {
        let report = self.processor.drain(identity).await?;
        if identity.is_some() && report.failed == 0 {
            self.mark_synced().await;
        }
        Some(report)
    }

    /// Drain with the session identity, if online.
    pub async fn sync_session(&self) -> Option<SyncReport> {
        if !self.network.is_online() {
            debug!("sync skipped: offline");
            return Some(SyncReport::default());
        }
        let session = self.session().await;
        self.manual_sync(session.as_ref()).await
    }

    /// Queue health
    pub async fn queue_status(&self) -> QueueStatus {
        self.queue.status().await
    }

    /// Delete failed entries
    pub async fn clear_failed_operations(&self) -> usize {
        self.queue.clear_failed().await
    }

    /// Reset failed entries so the next drain attempts them again
    pub async fn retry_failed_operations(&self) -> usize {
        self.queue.retry_failed().await
    }

    /// Time of the last drain or direct write that fully succeeded
    pub async fn last_sync_time(&self) -> Option<DateTime<Utc>> {
        match load_json(self.store.as_ref(), LAST_SYNC_STORAGE_KEY).await {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "stored last sync time is unreadable");
                None
            }
        }
    }

    async fn mark_synced(&self) {
        let now = self.clock.now_utc();
        if let Err(err) = save_json(self.store.as_ref(), LAST_SYNC_STORAGE_KEY, &now).await {
            warn!(error = %err, "failed to persist last sync time");
        }
    }

    /// Spawn a task that drains the queue on every offline to online
    /// transition until `cancel` fires.
    pub fn spawn_connectivity_listener(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let service = Arc::clone(self);
        let mut changes = self.network.subscribe();
        tokio::spawn(async move {
            let mut was_online = *changes.borrow_and_update();
            loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        debug!("connectivity listener stopped");
                        break;
                    }
                    changed = changes.changed() => {
                        if changed.is_err() {
                            debug!("network monitor dropped, listener exiting");
                            break;
                        }
                        let online = *changes.borrow_and_update();
                        if online && !was_online {
                            info!("back online, draining mutation queue");
                            if let Some(report) = service.sync_session().await {
                                info!(
                                    success = report.success,
                                    failed = report.failed,
                                    "reconnect drain finished"
                                );
                            }
                        } else if !online && was_online {
                            info!("went offline, mutations will be queued");
                        }
                        was_online = online;
                    }
                }
            }
        })
    }
}
