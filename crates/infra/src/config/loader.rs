//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the required variables are missing, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! Required:
//! - `CARELOG_DATA_DIR`: Directory for the local store
//! - `CARELOG_REMOTE_URL`: Base URL of the remote backend
//!
//! Optional (defaults from [`Config::default`]):
//! - `CARELOG_REMOTE_TIMEOUT`: Request timeout in seconds
//! - `CARELOG_SYNC_INTERVAL`: Seconds between periodic drains
//! - `CARELOG_SYNC_ENABLED`: Whether periodic drains run (true/false)
//! - `CARELOG_SYNC_MAX_ATTEMPTS`: Attempts before an entry is flagged failed
//! - `CARELOG_QUEUE_RETENTION_DAYS`: Age after which queued entries are dropped
//! - `CARELOG_BACKUP_ENABLED`: Whether backup timers run (true/false)
//! - `CARELOG_BACKUP_INTERVAL`: Seconds between snapshots
//! - `CARELOG_CHECKPOINT_INTERVAL`: Seconds between checkpoints
//! - `CARELOG_HEALTH_URL`: URL probed for connectivity
//! - `CARELOG_PROBE_INTERVAL`: Seconds between connectivity probes
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./carelog.json` or `./carelog.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use carelog_domain::{
    BackupConfig, CareLogError, Config, NetworkConfig, RemoteConfig, Result, StorageConfig,
    SyncConfig,
};

use crate::errors::InfraError;

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `CareLogError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// `CARELOG_DATA_DIR` and `CARELOG_REMOTE_URL` must be present; every other
/// variable falls back to its default.
///
/// # Errors
/// Returns `CareLogError::Config` if required variables are missing
/// or any variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let data_dir = env_var("CARELOG_DATA_DIR")?;
    let base_url = env_var("CARELOG_REMOTE_URL")?;

    let defaults = Config::default();

    Ok(Config {
        storage: StorageConfig { data_dir },
        remote: RemoteConfig {
            base_url,
            timeout_seconds: env_parse("CARELOG_REMOTE_TIMEOUT", defaults.remote.timeout_seconds)?,
        },
        sync: SyncConfig {
            interval_seconds: env_parse("CARELOG_SYNC_INTERVAL", defaults.sync.interval_seconds)?,
            enabled: env_bool("CARELOG_SYNC_ENABLED", defaults.sync.enabled),
            max_attempts: env_parse("CARELOG_SYNC_MAX_ATTEMPTS", defaults.sync.max_attempts)?,
            retention_days: env_parse(
                "CARELOG_QUEUE_RETENTION_DAYS",
                defaults.sync.retention_days,
            )?,
        },
        backup: BackupConfig {
            enabled: env_bool("CARELOG_BACKUP_ENABLED", defaults.backup.enabled),
            interval_seconds: env_parse(
                "CARELOG_BACKUP_INTERVAL",
                defaults.backup.interval_seconds,
            )?,
            checkpoint_interval_seconds: env_parse(
                "CARELOG_CHECKPOINT_INTERVAL",
                defaults.backup.checkpoint_interval_seconds,
            )?,
            ..defaults.backup
        },
        network: NetworkConfig {
            health_url: std::env::var("CARELOG_HEALTH_URL")
                .unwrap_or(defaults.network.health_url),
            probe_interval_seconds: env_parse(
                "CARELOG_PROBE_INTERVAL",
                defaults.network.probe_interval_seconds,
            )?,
        },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
/// Sections and fields missing from the file take their defaults.
///
/// # Errors
/// Returns `CareLogError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CareLogError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            CareLogError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| CareLogError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| CareLogError::from(InfraError::from(e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| CareLogError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(CareLogError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("carelog.json"),
        dir.join("carelog.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
        dir.join("../../config.json"),
        dir.join("../../config.toml"),
    ]
}

/// Get required environment variable
///
/// # Errors
/// Returns `CareLogError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| CareLogError::Config(format!("Missing required environment variable: {key}")))
}

/// Parse an optional environment variable, using `default` when unset.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| CareLogError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const OPTIONAL_VARS: &[&str] = &[
        "CARELOG_REMOTE_TIMEOUT",
        "CARELOG_SYNC_INTERVAL",
        "CARELOG_SYNC_ENABLED",
        "CARELOG_SYNC_MAX_ATTEMPTS",
        "CARELOG_QUEUE_RETENTION_DAYS",
        "CARELOG_BACKUP_ENABLED",
        "CARELOG_BACKUP_INTERVAL",
        "CARELOG_CHECKPOINT_INTERVAL",
        "CARELOG_HEALTH_URL",
        "CARELOG_PROBE_INTERVAL",
    ];

    fn clear_env() {
        std::env::remove_var("CARELOG_DATA_DIR");
        std::env::remove_var("CARELOG_REMOTE_URL");
        for key in OPTIONAL_VARS {
            std::env::remove_var(key);
        }
    }

    fn write_with_extension(contents: &str, extension: &str) -> PathBuf {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        let path = temp_file.path().with_extension(extension);
        std::fs::copy(temp_file.path(), &path).unwrap();
        path
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        for (i, value) in ["1", "true", "yes", "on", "TRUE"].iter().enumerate() {
            let key = format!("CARELOG_TEST_BOOL_TRUE_{i}");
            std::env::set_var(&key, value);
            assert!(env_bool(&key, false), "{value} should be true");
            std::env::remove_var(&key);
        }

        for (i, value) in ["0", "false", "no", "off"].iter().enumerate() {
            let key = format!("CARELOG_TEST_BOOL_FALSE_{i}");
            std::env::set_var(&key, value);
            assert!(!env_bool(&key, true), "{value} should be false");
            std::env::remove_var(&key);
        }

        std::env::remove_var("CARELOG_TEST_BOOL_MISSING");
        assert!(env_bool("CARELOG_TEST_BOOL_MISSING", true));
        assert!(!env_bool("CARELOG_TEST_BOOL_MISSING", false));
    }

    #[test]
    fn test_load_from_env_with_overrides() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("CARELOG_DATA_DIR", "/tmp/carelog");
        std::env::set_var("CARELOG_REMOTE_URL", "https://care.example/api");
        std::env::set_var("CARELOG_SYNC_INTERVAL", "15");
        std::env::set_var("CARELOG_SYNC_ENABLED", "false");
        std::env::set_var("CARELOG_BACKUP_INTERVAL", "600");

        let config = load_from_env().unwrap();
        assert_eq!(config.storage.data_dir, "/tmp/carelog");
        assert_eq!(config.remote.base_url, "https://care.example/api");
        assert_eq!(config.sync.interval_seconds, 15);
        assert!(!config.sync.enabled);
        assert_eq!(config.backup.interval_seconds, 600);
        assert_eq!(config.backup.retained_snapshots, 5);
        assert_eq!(config.sync.max_attempts, 3);

        clear_env();
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("CARELOG_DATA_DIR", "/tmp/carelog");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, CareLogError::Config(msg) if msg.contains("CARELOG_REMOTE_URL")));

        clear_env();
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("CARELOG_DATA_DIR", "/tmp/carelog");
        std::env::set_var("CARELOG_REMOTE_URL", "https://care.example/api");
        std::env::set_var("CARELOG_SYNC_MAX_ATTEMPTS", "three");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, CareLogError::Config(_)), "Should be a Config error");

        clear_env();
    }

    #[test]
    fn test_load_from_file_toml_partial() {
        let path = write_with_extension(
            r#"
[sync]
interval_seconds = 25
enabled = false

[backup]
retained_snapshots = 3
"#,
            "toml",
        );

        let config = load_from_file(Some(path.clone())).unwrap();
        assert_eq!(config.sync.interval_seconds, 25);
        assert!(!config.sync.enabled);
        assert_eq!(config.backup.retained_snapshots, 3);
        assert_eq!(config.backup.retained_checkpoints, 10);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_not_found() {
        let err = load_from_file(Some(PathBuf::from("/nonexistent/config.json"))).unwrap_err();
        assert!(matches!(err, CareLogError::Config(_)), "Should be a Config error");
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let path = write_with_extension(r#"{ "this is": "not valid json" "#, "json");
        assert!(load_from_file(Some(path.clone())).is_err(), "Should fail with invalid JSON");
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_parse_config_invalid_toml_is_config_error() {
        let err = parse_config("[sync", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, CareLogError::Config(_)));
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("some content", Path::new("test.yaml"));
        assert!(result.is_err(), "Should fail with unsupported format");
    }
}
