//! Availability set explicitly by the host application

use tokio::sync::watch;
use tracing::info;

use super::ports::NetworkMonitor;

/// [`NetworkMonitor`] driven by explicit `set_online` calls
///
/// Suits hosts that already receive platform connectivity events, and tests.
#[derive(Debug)]
pub struct ManualNetwork {
    sender: watch::Sender<bool>,
}

impl ManualNetwork {
    /// Monitor starting in the given state
    pub fn new(online: bool) -> Self {
        let (sender, _) = watch::channel(online);
        Self { sender }
    }

    /// Publish a new state. Returns true when it differs from the previous one.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.sender.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            info!(online, "network availability changed");
        }
        changed
    }
}

impl NetworkMonitor for ManualNetwork {
    fn is_online(&self) -> bool {
        *self.sender.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}
