//! Port interfaces for durable local storage

use async_trait::async_trait;
use carelog_domain::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// String key/value store that survives restarts
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Read a value, `None` when the key was never written
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a key. Missing keys are not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// All keys currently stored
    async fn keys(&self) -> Result<Vec<String>>;
}

/// Read and decode a JSON value stored under `key`.
///
/// # Errors
/// Storage failures and undecodable content are both returned as errors;
/// callers decide whether corrupt content degrades to a default.
pub async fn load_json<T: DeserializeOwned>(store: &dyn LocalStore, key: &str) -> Result<Option<T>> {
    match store.get(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode `value` as JSON and store it under `key`.
pub async fn save_json<T: Serialize + Sync>(
    store: &dyn LocalStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw).await
}
