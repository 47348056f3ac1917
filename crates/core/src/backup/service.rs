//! Full-state snapshots, checkpoints, export and import

use std::sync::Arc;

use carelog_common::testing::Clock;
use carelog_domain::constants::{
    APP_VERSION, BACKUPS_STORAGE_KEY, BACKUP_SCHEMA_VERSION, CHECKPOINTS_STORAGE_KEY, MAX_BACKUPS,
    MAX_CHECKPOINTS,
};
use carelog_domain::{
    AppState, CareLogError, Checkpoint, CheckpointStatus, ExportDocument, Identity, Result,
    Snapshot,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::state_ports::StateStore;
use crate::storage::{load_json, save_json, LocalStore};
use crate::sync::RemoteBackend;

/// Owns the snapshot and checkpoint lists
pub struct BackupService {
    state: Arc<dyn StateStore>,
    store: Arc<dyn LocalStore>,
    backend: Arc<dyn RemoteBackend>,
    clock: Arc<dyn Clock>,
    retained_snapshots: usize,
    retained_checkpoints: usize,
    // Serializes read-modify-write of the stored lists.
    write_lock: Mutex<()>,
}

impl BackupService {
    /// Service with the default retention
    pub fn new(
        state: Arc<dyn StateStore>,
        store: Arc<dyn LocalStore>,
        backend: Arc<dyn RemoteBackend>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state,
            store,
            backend,
            clock,
            retained_snapshots: MAX_BACKUPS,
            retained_checkpoints: MAX_CHECKPOINTS,
            write_lock: Mutex::new(()),
        }
    }

    /// Override how many snapshots and checkpoints are kept (minimum 1 each)
    #[must_use]
    pub fn with_retention(mut self, snapshots: usize, checkpoints: usize) -> Self {
        self.retained_snapshots = snapshots.max(1);
        self.retained_checkpoints = checkpoints.max(1);
        self
    }

    /// Snapshot the whole state, keep the newest snapshots, and mirror the
    /// new one remotely when an identity is given.
    ///
    /// Only reading the live state can fail. Local persistence and the remote
    /// mirror are best effort.
    #[instrument(skip_all, fields(mirrored = identity.is_some()))]
    pub async fn create_backup(&self, identity: Option<&Identity>) -> Result<Snapshot> {
        let snapshot = self.take_snapshot().await?;

        if let Err(err) = self.store_snapshot(&snapshot).await {
            warn!(snapshot_id = %snapshot.id, error = %err, "failed to persist backup");
        }

        if let Some(identity) = identity {
            if let Err(err) = self.backend.save_backup(identity, &snapshot).await {
                warn!(snapshot_id = %snapshot.id, error = %err, "remote backup mirror failed");
            }
        }

        Ok(snapshot)
    }

    async fn take_snapshot(&self) -> Result<Snapshot> {
        let state = self.state.snapshot_state().await?;
        Ok(Snapshot {
            id: Uuid::new_v4(),
            timestamp: self.clock.now_utc(),
            schema_version: BACKUP_SCHEMA_VERSION,
            state,
        })
    }

    /// Append `snapshot` to the stored list and rotate it.
    async fn store_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let _lock = self.write_lock.lock().await;
        let mut backups: Vec<Snapshot> = self.read_list(BACKUPS_STORAGE_KEY).await;
        backups.push(snapshot.clone());
        let dropped = rotate(&mut backups, self.retained_snapshots);
        save_json(self.store.as_ref(), BACKUPS_STORAGE_KEY, &backups).await?;
        info!(
            snapshot_id = %snapshot.id,
            records = snapshot.state.change_counters().total(),
            retained = backups.len(),
            dropped,
            "backup created"
        );
        Ok(())
    }

    /// Stored snapshots, oldest first
    pub async fn list_backups(&self) -> Vec<Snapshot> {
        self.read_list(BACKUPS_STORAGE_KEY).await
    }

    /// Number of stored snapshots
    pub async fn backup_count(&self) -> usize {
        self.list_backups().await.len()
    }

    /// Newest stored snapshot
    pub async fn latest_backup(&self) -> Option<Snapshot> {
        self.list_backups().await.pop()
    }

    /// Replace the live state with the snapshot's state
    #[instrument(skip_all, fields(snapshot_id = %snapshot.id))]
    pub async fn restore(&self, snapshot: &Snapshot) -> Result<()> {
        self.state.replace_state(snapshot.state.clone()).await?;
        info!(timestamp = %snapshot.timestamp, "state restored from snapshot");
        Ok(())
    }

    /// Restore the newest stored snapshot
    ///
    /// # Errors
    /// `NotFound` when no snapshot is stored.
    pub async fn restore_latest(&self) -> Result<Snapshot> {
        let snapshot = self
            .latest_backup()
            .await
            .ok_or_else(|| CareLogError::NotFound("no backup available".to_string()))?;
        self.restore(&snapshot).await?;
        Ok(snapshot)
    }

    /// Record a fingerprint of the live state
    #[instrument(skip(self))]
    pub async fn create_checkpoint(&self, status: CheckpointStatus) -> Result<Checkpoint> {
        let state = self.state.snapshot_state().await?;
        let checkpoint = Checkpoint {
            id: Uuid::new_v4(),
            timestamp: self.clock.now_utc(),
            status,
            content_hash: content_hash(&state)?,
            change_counters: state.change_counters(),
        };

        let _lock = self.write_lock.lock().await;
        let mut checkpoints: Vec<Checkpoint> = self.read_list(CHECKPOINTS_STORAGE_KEY).await;
        checkpoints.push(checkpoint.clone());
        rotate(&mut checkpoints, self.retained_checkpoints);
        self.write_list(CHECKPOINTS_STORAGE_KEY, &checkpoints).await;
        debug!(checkpoint_id = %checkpoint.id, hash = %checkpoint.content_hash, "checkpoint recorded");

        Ok(checkpoint)
    }

    /// Stored checkpoints, oldest first
    pub async fn list_checkpoints(&self) -> Vec<Checkpoint> {
        self.read_list(CHECKPOINTS_STORAGE_KEY).await
    }

    /// Newest stored checkpoint
    pub async fn latest_checkpoint(&self) -> Option<Checkpoint> {
        self.list_checkpoints().await.pop()
    }

    /// Whether the live state differs from the newest checkpoint.
    ///
    /// True when no checkpoint exists yet.
    pub async fn has_drifted(&self) -> Result<bool> {
        let Some(latest) = self.latest_checkpoint().await else {
            return Ok(true);
        };
        let state = self.state.snapshot_state().await?;
        Ok(content_hash(&state)? != latest.content_hash)
    }

    /// Live state wrapped in an export document
    pub async fn export_data(&self) -> Result<ExportDocument> {
        let state = self.state.snapshot_state().await?;
        Ok(ExportDocument {
            exported_at: self.clock.now_utc(),
            app_version: APP_VERSION.to_string(),
            state,
        })
    }

    /// Export document as pretty-printed JSON
    pub async fn export_json(&self) -> Result<String> {
        let document = self.export_data().await?;
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Validate `json` and replace the live state with it.
    ///
    /// A safety backup of the current state is stored first. Nothing changes
    /// when validation fails or the safety backup cannot be stored.
    ///
    /// # Errors
    /// `Validation` when `json` is not an object carrying `profiles` and
    /// `logs`, or when a collection has the wrong shape. The storage error
    /// when the safety backup cannot be persisted.
    #[instrument(skip_all, fields(bytes = json.len()))]
    pub async fn import_data(&self, json: &str) -> Result<()> {
        let state = parse_import(json)?;

        let safety = self.take_snapshot().await?;
        self.store_snapshot(&safety).await?;
        debug!(snapshot_id = %safety.id, "safety backup taken before import");

        self.state.replace_state(state).await?;
        info!("import applied");
        Ok(())
    }

    async fn read_list<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        match load_json::<Vec<T>>(self.store.as_ref(), key).await {
            Ok(list) => list.unwrap_or_default(),
            Err(err) => {
                warn!(key, error = %err, "stored list is unreadable, treating as empty");
                Vec::new()
            }
        }
    }

    async fn write_list<T: Serialize + Sync>(&self, key: &str, list: &[T]) {
        if let Err(err) = save_json(self.store.as_ref(), key, &list).await {
            warn!(key, error = %err, "failed to persist list");
        }
    }
}

/// Drop the oldest entries beyond `keep`, returning how many were dropped.
fn rotate<T>(list: &mut Vec<T>, keep: usize) -> usize {
    let excess = list.len().saturating_sub(keep);
    list.drain(..excess);
    excess
}

/// SHA-256 over the JSON encoding of `state`, hex encoded.
///
/// Object keys encode in sorted order, so equal states hash equally.
pub fn content_hash(state: &AppState) -> Result<String> {
    let bytes = serde_json::to_vec(state)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

fn parse_import(json: &str) -> Result<AppState> {
    let value: Value = serde_json::from_str(json)
        .map_err(|err| CareLogError::Validation(format!("import is not valid JSON: {err}")))?;

    let Some(object) = value.as_object() else {
        return Err(CareLogError::Validation("import must be a JSON object".to_string()));
    };
    for required in ["profiles", "logs"] {
        if !object.contains_key(required) {
            return Err(CareLogError::Validation(format!("import is missing `{required}`")));
        }
    }

    serde_json::from_value(value)
        .map_err(|err| CareLogError::Validation(format!("import has an invalid shape: {err}")))
}
