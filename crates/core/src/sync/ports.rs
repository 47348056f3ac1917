//! Port interfaces for sync operations

use async_trait::async_trait;
use carelog_domain::{EntityRef, Identity, Snapshot};
use serde_json::Value;

use super::errors::RemoteError;

/// Result type for remote backend calls
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Remote persistence for entities and backups
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Create an entity
    async fn add(&self, identity: &Identity, target: &EntityRef, payload: &Value)
        -> RemoteResult<()>;

    /// Replace an entity
    async fn update(
        &self,
        identity: &Identity,
        target: &EntityRef,
        payload: &Value,
    ) -> RemoteResult<()>;

    /// Delete an entity
    async fn delete(&self, identity: &Identity, target: &EntityRef) -> RemoteResult<()>;

    /// Mirror a full-state snapshot
    async fn save_backup(&self, identity: &Identity, snapshot: &Snapshot) -> RemoteResult<()>;
}
