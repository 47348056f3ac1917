//! One-file-per-key local store
//!
//! Each key is stored as `<dir>/<key>.json`. Writes go to a temporary file
//! that is synced and renamed over the target, so a crash never leaves a
//! half-written value behind. A `<key>.sha256` sidecar holds the checksum of
//! the last write; a mismatch on read is logged and the content is still
//! returned, leaving the decision about corrupt content to the caller.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use carelog_core::LocalStore;
use carelog_domain::{CareLogError, Result};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

use crate::errors::InfraError;

const VALUE_EXTENSION: &str = "json";
const CHECKSUM_EXTENSION: &str = "sha256";
const TEMP_EXTENSION: &str = "tmp";

/// Durable [`LocalStore`] rooted at a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    /// Returns `CareLogError::Storage` when the directory cannot be created.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await.map_err(InfraError::from)?;
        debug!(dir = %dir.display(), "file store opened");
        Ok(Self { dir })
    }

    /// Root directory of the store
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str, extension: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.{extension}")))
    }

    async fn verify_checksum(&self, key: &str, data: &[u8]) -> Result<()> {
        let checksum_path = self.path_for(key, CHECKSUM_EXTENSION)?;
        match fs::read_to_string(&checksum_path).await {
            Ok(expected) if expected.trim() != checksum(data) => {
                warn!(key, "checksum mismatch, stored value may be corrupted");
            }
            Ok(_) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(key, "no checksum sidecar");
            }
            Err(err) => warn!(key, error = %err, "failed to read checksum sidecar"),
        }
        Ok(())
    }
}

#[async_trait]
impl LocalStore for FileStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key, VALUE_EXTENSION)?;
        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(InfraError::from(err).into()),
        };

        self.verify_checksum(key, &data).await?;

        String::from_utf8(data)
            .map(Some)
            .map_err(|e| CareLogError::Storage(format!("value for `{key}` is not UTF-8: {e}")))
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key, VALUE_EXTENSION)?;
        let temp_path = self.path_for(key, TEMP_EXTENSION)?;

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .await
            .map_err(InfraError::from)?;
        file.write_all(value.as_bytes()).await.map_err(InfraError::from)?;
        file.sync_all().await.map_err(InfraError::from)?;
        drop(file);

        fs::rename(&temp_path, &path).await.map_err(InfraError::from)?;

        let checksum_path = self.path_for(key, CHECKSUM_EXTENSION)?;
        if let Err(err) = fs::write(&checksum_path, checksum(value.as_bytes())).await {
            warn!(key, error = %err, "failed to write checksum sidecar");
        }

        debug!(key, "value written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        for extension in [VALUE_EXTENSION, CHECKSUM_EXTENSION] {
            let path = self.path_for(key, extension)?;
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(InfraError::from(err).into()),
            }
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut entries = fs::read_dir(&self.dir).await.map_err(InfraError::from)?;
        let mut keys = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(InfraError::from)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(VALUE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }

        keys.sort();
        Ok(keys)
    }
}

/// Keys become file names, so only a conservative character set is allowed.
fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && !key.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(CareLogError::Validation(format!("invalid storage key: {key:?}")))
    }
}

fn checksum(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    async fn store() -> (TempDir, FileStore) {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("data")).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_set_get_remove() {
        let (_dir, store) = store().await;

        assert_eq!(store.get("offline_queue").await.unwrap(), None);

        store.set("offline_queue", "[]").await.unwrap();
        store.set("offline_queue", r#"[{"id":1}]"#).await.unwrap();
        assert_eq!(store.get("offline_queue").await.unwrap().as_deref(), Some(r#"[{"id":1}]"#));
        assert!(store.dir().join("offline_queue.sha256").exists());
        assert!(!store.dir().join("offline_queue.tmp").exists());

        store.remove("offline_queue").await.unwrap();
        store.remove("offline_queue").await.unwrap();
        assert_eq!(store.get("offline_queue").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_keys_lists_only_values() {
        let (_dir, store) = store().await;
        store.set("backups", "[]").await.unwrap();
        store.set("checkpoints", "[]").await.unwrap();

        assert_eq!(store.keys().await.unwrap(), vec!["backups", "checkpoints"]);
    }

    #[tokio::test]
    async fn test_corrupted_checksum_still_returns_value() {
        let (_dir, store) = store().await;
        store.set("last_sync_time", "\"2024-01-01T00:00:00Z\"").await.unwrap();
        std::fs::write(store.dir().join("last_sync_time.sha256"), "deadbeef").unwrap();

        let value = store.get("last_sync_time").await.unwrap();
        assert_eq!(value.as_deref(), Some("\"2024-01-01T00:00:00Z\""));
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let (_dir, store) = store().await;
        for key in ["", "../escape", "a/b", ".hidden"] {
            let err = store.set(key, "x").await.unwrap_err();
            assert!(matches!(err, CareLogError::Validation(_)), "{key}");
        }
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let (dir, store) = store().await;
        store.set("offline_queue", "[1,2,3]").await.unwrap();
        drop(store);

        let reopened = FileStore::open(dir.path().join("data")).await.unwrap();
        assert_eq!(reopened.get("offline_queue").await.unwrap().as_deref(), Some("[1,2,3]"));
    }
}
