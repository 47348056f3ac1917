use std::sync::{Arc, Once};
use std::time::Duration;

use carelog_common::testing::MockClock;
use carelog_core::{LocalStore, ManualNetwork, NetworkMonitor, RemoteBackend};
use carelog_domain::Config;
use carelog_infra::{FileStore, RestBackend, RestBackendConfig};
use carelog_lib::{AppContext, AppParts};
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

/// Application context over a temporary file store, a REST backend pointed
/// at `remote_url` and a hand-driven network.
pub struct TestApp {
    pub ctx: Arc<AppContext>,
    pub network: Arc<ManualNetwork>,
    pub clock: Arc<MockClock>,
    _dir: TempDir,
}

/// Config with both schedulers disabled so tests drive every drain.
pub fn quiet_config() -> Config {
    let mut config = Config::default();
    config.sync.enabled = false;
    config.backup.enabled = false;
    config
}

pub async fn setup_app(remote_url: &str, online: bool, config: Config) -> TestApp {
    init_test_tracing();
    let dir = TempDir::new().expect("temp dir should be created");
    let store: Arc<dyn LocalStore> =
        Arc::new(FileStore::open(dir.path().join("data")).await.expect("store should open"));
    let backend: Arc<dyn RemoteBackend> = Arc::new(
        RestBackend::new(RestBackendConfig {
            base_url: remote_url.to_string(),
            timeout: Duration::from_secs(2),
        })
        .expect("backend should build"),
    );
    let network = Arc::new(ManualNetwork::new(online));
    let clock = Arc::new(MockClock::new());

    let ctx = AppContext::from_parts(AppParts {
        config,
        store,
        backend,
        network: Arc::clone(&network) as Arc<dyn NetworkMonitor>,
        clock: Arc::clone(&clock) as _,
    })
    .await;

    TestApp { ctx: Arc::new(ctx), network, clock, _dir: dir }
}
