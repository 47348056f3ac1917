use std::time::Duration;

use carelog_domain::CareLogError;
use tracing::{info, warn};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Environment variable that switches log output to JSON lines.
pub const LOG_JSON_ENV: &str = "CARELOG_LOG_JSON";

/// Install the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Output is JSON
/// when `CARELOG_LOG_JSON` is set to anything but `0`/`false`. A second call
/// leaves the first subscriber in place.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(LOG_JSON_ENV)
        .map(|value| !matches!(value.trim().to_ascii_lowercase().as_str(), "" | "0" | "false"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if json {
        registry.with(fmt::layer().json().with_current_span(false)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Log the outcome of a command execution with structured fields.
///
/// `command` is a stable identifier such as `"sync::manual_sync"`. Callers
/// must not forward user data through it.
#[inline]
pub fn log_command_execution(command: &str, elapsed: Duration, success: bool) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    if success {
        info!(command, duration_ms, "command_execution_success");
    } else {
        warn!(command, duration_ms, "command_execution_failure");
    }
}

/// Convert a `CareLogError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &CareLogError) -> &'static str {
    match error {
        CareLogError::Storage(_) => "storage",
        CareLogError::Config(_) => "config",
        CareLogError::Network(_) => "network",
        CareLogError::Remote(_) => "remote",
        CareLogError::Validation(_) => "validation",
        CareLogError::NotFound(_) => "not_found",
        CareLogError::Serialization(_) => "serialization",
        CareLogError::Internal(_) => "internal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_labels_are_stable() {
        assert_eq!(error_label(&CareLogError::NotFound("backup".into())), "not_found");
        assert_eq!(error_label(&CareLogError::Validation("bad".into())), "validation");
        assert_eq!(error_label(&CareLogError::Serialization("eof".into())), "serialization");
    }

    #[test]
    fn test_init_tracing_twice() {
        init_tracing();
        init_tracing();
        log_command_execution("test::noop", Duration::from_millis(3), true);
    }
}
