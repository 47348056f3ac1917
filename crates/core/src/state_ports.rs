//! Port interface for the application's entity collections

use async_trait::async_trait;
use carelog_domain::{AppState, Result};

/// Live entity collections and settings
///
/// Reads return a full copy. `replace_state` overwrites every collection and
/// is only used by restore and import.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Copy of the current state
    async fn snapshot_state(&self) -> Result<AppState>;

    /// Overwrite the current state wholesale
    async fn replace_state(&self, state: AppState) -> Result<()>;
}
