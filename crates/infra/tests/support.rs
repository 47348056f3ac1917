use std::sync::{Arc, Once};
use std::time::Duration;

use carelog_common::testing::{Clock, MockClock};
use carelog_core::{LocalStore, ManualNetwork, MutationQueue, OfflineSyncService, SyncDeps};
use carelog_infra::{FileStore, RestBackend, RestBackendConfig};
use tempfile::TempDir;

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness once per binary.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// File store in a temporary directory that lives as long as the fixture.
pub struct TestStore {
    pub store: Arc<FileStore>,
    pub dir: TempDir,
}

impl TestStore {
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("temp dir should be created");
        let store = FileStore::open(dir.path().join("data")).await.expect("store should open");
        Self { store: Arc::new(store), dir }
    }

    /// A second store over the same directory, as after a restart.
    pub async fn reopen(&self) -> Arc<FileStore> {
        Arc::new(FileStore::open(self.dir.path().join("data")).await.expect("store should reopen"))
    }
}

/// REST backend pointed at a mock server.
pub fn rest_backend(base_url: &str) -> Arc<RestBackend> {
    Arc::new(
        RestBackend::new(RestBackendConfig {
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(2),
        })
        .expect("backend should build"),
    )
}

/// Coordinator over a file store, a REST backend and a manual network.
pub async fn file_backed_sync(
    store: Arc<dyn LocalStore>,
    backend: Arc<RestBackend>,
    network: Arc<ManualNetwork>,
) -> Arc<OfflineSyncService> {
    let clock: Arc<dyn Clock> = Arc::new(MockClock::new());
    let queue = Arc::new(MutationQueue::load(Arc::clone(&store), Arc::clone(&clock)).await);
    Arc::new(OfflineSyncService::new(SyncDeps { queue, backend, network, store, clock }))
}
