//! Remote backend error types
//!
//! Adapter failures carry enough detail (status, code, message) for the
//! retry layer to decide whether another attempt can succeed.

use carelog_common::resilience::{classify_failure, ClassifyFailure, FailureClass};
use carelog_domain::CareLogError;
use thiserror::Error;

/// Categories of remote errors, for logging and metrics labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorCategory {
    /// Authentication or authorization refused (401, 403)
    Authentication,
    /// Rate limiting (429)
    RateLimit,
    /// Server errors (5xx)
    Server,
    /// Other client errors (4xx)
    Client,
    /// Connection failures and timeouts
    Network,
    /// Failures without a transport-level signal
    Unknown,
}

/// Failure reported by a remote backend adapter
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("{code}: {message}")]
    Coded { code: String, message: String },

    #[error("{0}")]
    Other(String),
}

impl RemoteError {
    /// Error for an HTTP response with a non-success status.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http { status, message: message.into() }
    }

    /// Error carrying a backend error code such as `permission-denied`.
    pub fn coded(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Coded { code: code.into(), message: message.into() }
    }

    /// Get the error category for this error
    pub fn category(&self) -> RemoteErrorCategory {
        match self {
            Self::Network(_) | Self::Timeout(_) => RemoteErrorCategory::Network,
            Self::Http { status: 401 | 403, .. } => RemoteErrorCategory::Authentication,
            Self::Http { status: 429, .. } => RemoteErrorCategory::RateLimit,
            Self::Http { status: 500..=599, .. } => RemoteErrorCategory::Server,
            Self::Http { .. } => RemoteErrorCategory::Client,
            Self::Coded { .. } | Self::Other(_) => RemoteErrorCategory::Unknown,
        }
    }

    /// Check if this error should be retried
    pub fn should_retry(&self) -> bool {
        self.failure_class().is_retryable()
    }
}

impl ClassifyFailure for RemoteError {
    fn failure_class(&self) -> FailureClass {
        match self {
            Self::Network(_) | Self::Timeout(_) => FailureClass::Retryable,
            Self::Http { status, message } => classify_failure(None, Some(*status), message),
            Self::Coded { code, message } => classify_failure(Some(code.as_str()), None, message),
            Self::Other(message) => classify_failure(None, None, message),
        }
    }
}

impl From<RemoteError> for CareLogError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Network(message) | RemoteError::Timeout(message) => {
                Self::Network(message)
            }
            other => Self::Remote(other.to_string()),
        }
    }
}
