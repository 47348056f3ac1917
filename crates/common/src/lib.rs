//! Common utilities shared across CareLog crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: error and time primitives without an async runtime
//! - `runtime`: async infrastructure (retry executor, clock)
//! - `test-utils`: helpers for downstream test suites

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "runtime", feature = "test-utils"))]
pub mod testing;

#[cfg(feature = "runtime")]
pub use resilience::{
    classify_failure, with_retry, ClassifyFailure, FailureClass, FailureNotifier, RetryConfig,
    RetryDecision, RetryError, RetryExecutor, RetryOptions, RetryPolicy,
};
#[cfg(any(feature = "runtime", feature = "test-utils"))]
pub use testing::{Clock, MockClock, SystemClock};
