//! Conversions from external infrastructure errors into domain errors.

use std::io::{Error as IoError, ErrorKind};

use carelog_domain::CareLogError;
use toml::de::Error as TomlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub CareLogError);

impl From<InfraError> for CareLogError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<CareLogError> for InfraError {
    fn from(value: CareLogError) -> Self {
        Self(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoCareLogError {
    fn into_carelog(self) -> CareLogError;
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → CareLogError */
/* -------------------------------------------------------------------------- */

impl IntoCareLogError for IoError {
    fn into_carelog(self) -> CareLogError {
        match self.kind() {
            ErrorKind::NotFound => CareLogError::NotFound(format!("file not found: {self}")),
            ErrorKind::PermissionDenied => {
                CareLogError::Storage(format!("permission denied: {self}"))
            }
            ErrorKind::InvalidData => CareLogError::Serialization(self.to_string()),
            _ => CareLogError::Storage(self.to_string()),
        }
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        Self(value.into_carelog())
    }
}

/* -------------------------------------------------------------------------- */
/* toml::de::Error → CareLogError */
/* -------------------------------------------------------------------------- */

impl IntoCareLogError for TomlError {
    fn into_carelog(self) -> CareLogError {
        CareLogError::Config(format!("invalid TOML: {}", self.message()))
    }
}

impl From<TomlError> for InfraError {
    fn from(value: TomlError) -> Self {
        Self(value.into_carelog())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_not_found_maps_to_not_found() {
        let err = IoError::new(ErrorKind::NotFound, "offline_queue.json");
        let mapped: CareLogError = InfraError::from(err).into();
        assert!(matches!(mapped, CareLogError::NotFound(msg) if msg.contains("offline_queue")));
    }

    /// Validates the remaining io mappings used by the file store.
    ///
    /// Assertions:
    /// - Permission errors and other failures are storage errors.
    /// - Invalid data is a serialization error.
    #[test]
    fn io_kinds_map_to_storage_or_serialization() {
        for kind in [ErrorKind::PermissionDenied, ErrorKind::Other] {
            let mapped: CareLogError = InfraError::from(IoError::new(kind, "disk")).into();
            assert!(matches!(mapped, CareLogError::Storage(_)), "{kind:?}: {mapped:?}");
        }

        let mapped: CareLogError =
            InfraError::from(IoError::new(ErrorKind::InvalidData, "bad utf-8")).into();
        assert!(matches!(mapped, CareLogError::Serialization(_)));
    }

    #[test]
    fn toml_error_maps_to_config() {
        let err = toml::from_str::<toml::Value>("sync = [").unwrap_err();
        let mapped: CareLogError = InfraError::from(err).into();
        assert!(matches!(mapped, CareLogError::Config(msg) if msg.contains("TOML")));
    }
}
