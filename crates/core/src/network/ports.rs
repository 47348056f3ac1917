//! Port interface for network availability

use tokio::sync::watch;

/// Publishes whether the remote backend is reachable
///
/// Subscribers see every change through a `watch` channel; the current value
/// is always available without waiting.
pub trait NetworkMonitor: Send + Sync {
    /// Current availability
    fn is_online(&self) -> bool;

    /// Receiver that observes availability changes
    fn subscribe(&self) -> watch::Receiver<bool>;
}
