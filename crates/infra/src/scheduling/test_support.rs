//! Shared fixtures for scheduler tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use carelog_common::testing::{Clock, MockClock};
use carelog_core::sync::RemoteResult;
use carelog_core::{
    LocalStore, ManualNetwork, MemoryStore, MutationQueue, OfflineSyncService, RemoteBackend,
    SyncDeps,
};
use carelog_domain::{EntityRef, Identity, Snapshot};
use serde_json::Value;

/// Backend that accepts everything and counts calls
#[derive(Default)]
pub struct RecordingBackend {
    entity_calls: AtomicUsize,
    backup_calls: AtomicUsize,
}

impl RecordingBackend {
    pub fn calls(&self) -> usize {
        self.entity_calls.load(Ordering::SeqCst)
    }

    pub fn backups(&self) -> usize {
        self.backup_calls.load(Ordering::SeqCst)
    }

    fn record(&self) -> RemoteResult<()> {
        self.entity_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl RemoteBackend for RecordingBackend {
    async fn add(&self, _: &Identity, _: &EntityRef, _: &Value) -> RemoteResult<()> {
        self.record()
    }
    async fn update(&self, _: &Identity, _: &EntityRef, _: &Value) -> RemoteResult<()> {
        self.record()
    }
    async fn delete(&self, _: &Identity, _: &EntityRef) -> RemoteResult<()> {
        self.record()
    }
    async fn save_backup(&self, _: &Identity, _: &Snapshot) -> RemoteResult<()> {
        self.backup_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Coordinator over in-memory collaborators
pub async fn recording_sync(
    online: bool,
) -> (Arc<OfflineSyncService>, Arc<RecordingBackend>, Arc<MockClock>) {
    let store: Arc<dyn LocalStore> = Arc::new(MemoryStore::new());
    let clock = Arc::new(MockClock::new());
    let dyn_clock: Arc<dyn Clock> = clock.clone();
    let backend = Arc::new(RecordingBackend::default());
    let queue = Arc::new(MutationQueue::load(Arc::clone(&store), Arc::clone(&dyn_clock)).await);

    let sync = OfflineSyncService::new(SyncDeps {
        queue,
        backend: backend.clone(),
        network: Arc::new(ManualNetwork::new(online)),
        store,
        clock: dyn_clock,
    });
    (Arc::new(sync), backend, clock)
}
