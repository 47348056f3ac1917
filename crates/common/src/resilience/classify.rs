//! Retryable versus fatal failure classification.
//!
//! Remote failures arrive as some mix of a machine code (`"unavailable"`,
//! `"permission-denied"`), an HTTP status, and a free-form message.
//! [`classify_failure`] reduces those to a [`FailureClass`]. Anything it
//! cannot recognise is treated as retryable.

use std::fmt;

/// Whether a failed operation is worth attempting again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// Transient; another attempt may succeed.
    Retryable,
    /// Permanent; retrying cannot help.
    Fatal,
}

impl FailureClass {
    /// True for [`FailureClass::Retryable`].
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Retryable)
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retryable => f.write_str("retryable"),
            Self::Fatal => f.write_str("fatal"),
        }
    }
}

/// Errors that know which [`FailureClass`] they belong to.
pub trait ClassifyFailure {
    /// Classification of this error.
    fn failure_class(&self) -> FailureClass;
}

const FATAL_MARKERS: &[&str] =
    &["permission-denied", "unauthenticated", "unauthorized", "not-found", "invalid-argument"];

const RETRYABLE_MARKERS: &[&str] = &[
    "network",
    "timeout",
    "timed-out",
    "connection",
    "unavailable",
    "deadline-exceeded",
    "resource-exhausted",
];

/// Classify an HTTP status code.
///
/// 5xx and 429 are retryable. 400, 401, 403, 404 and 422 are fatal. Any other
/// status has no opinion.
pub const fn classify_status(status: u16) -> Option<FailureClass> {
    match status {
        429 | 500..=599 => Some(FailureClass::Retryable),
        400 | 401 | 403 | 404 | 422 => Some(FailureClass::Fatal),
        _ => None,
    }
}

/// Classify a failure from whatever the caller knows about it.
///
/// Precedence: HTTP status, then the code, then the message. Within text,
/// fatal markers win over retryable ones. Unrecognised failures are
/// retryable.
pub fn classify_failure(code: Option<&str>, status: Option<u16>, message: &str) -> FailureClass {
    if let Some(class) = status.and_then(classify_status) {
        return class;
    }

    if let Some(class) = code.and_then(classify_text) {
        return class;
    }

    classify_text(message).unwrap_or(FailureClass::Retryable)
}

fn classify_text(text: &str) -> Option<FailureClass> {
    let normalized = normalize(text);
    if FATAL_MARKERS.iter().any(|marker| normalized.contains(marker)) {
        return Some(FailureClass::Fatal);
    }
    if RETRYABLE_MARKERS.iter().any(|marker| normalized.contains(marker)) {
        return Some(FailureClass::Retryable);
    }
    None
}

fn normalize(text: &str) -> String {
    text.trim()
        .chars()
        .map(|c| if c == '_' || c.is_whitespace() { '-' } else { c.to_ascii_lowercase() })
        .collect()
}
