//! Configuration management

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BACKUP_INTERVAL_SECS, DEFAULT_CHECKPOINT_INTERVAL_SECS, DEFAULT_QUEUE_RETENTION_DAYS,
    MAX_BACKUPS, MAX_CHECKPOINTS, MAX_SYNC_ATTEMPTS,
};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub sync: SyncConfig,
    pub backup: BackupConfig,
    pub remote: RemoteConfig,
    pub network: NetworkConfig,
}

/// Local storage configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one file per storage key.
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: "carelog-data".to_string() }
    }
}

/// Sync configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds between periodic drains.
    pub interval_seconds: u64,
    pub enabled: bool,
    /// Attempts before a queued entry is flagged failed.
    pub max_attempts: u32,
    /// Queued entries older than this are dropped by cleanup.
    pub retention_days: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 60,
            enabled: true,
            max_attempts: MAX_SYNC_ATTEMPTS,
            retention_days: DEFAULT_QUEUE_RETENTION_DAYS,
        }
    }
}

/// Backup and checkpoint configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    pub enabled: bool,
    /// Seconds between full snapshots.
    pub interval_seconds: u64,
    /// Seconds between checkpoints.
    pub checkpoint_interval_seconds: u64,
    pub retained_snapshots: usize,
    pub retained_checkpoints: usize,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: DEFAULT_BACKUP_INTERVAL_SECS,
            checkpoint_interval_seconds: DEFAULT_CHECKPOINT_INTERVAL_SECS,
            retained_snapshots: MAX_BACKUPS,
            retained_checkpoints: MAX_CHECKPOINTS,
        }
    }
}

/// Remote backend configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self { base_url: "http://localhost:8080/api".to_string(), timeout_seconds: 15 }
    }
}

/// Connectivity probe configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// URL answered with any 2xx while the backend is reachable.
    pub health_url: String,
    pub probe_interval_seconds: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self { health_url: "http://localhost:8080/health".to_string(), probe_interval_seconds: 15 }
    }
}
