//! Resilience patterns for remote calls.
//!
//! - **Classification**: decides whether a failure is transient or permanent.
//! - **Retry**: bounded retries with exponential backoff, driven by a policy.

pub mod classify;
pub mod retry;

pub use classify::{classify_failure, classify_status, ClassifyFailure, FailureClass};
pub use retry::{
    policies, with_retry, BackoffStrategy, ClassifiedRetry, FailureNotifier, InvalidRetryConfig,
    OnRetry, RetryConfig, RetryConfigBuilder, RetryDecision, RetryError, RetryExecutor,
    RetryOptions, RetryOutcome, RetryPolicy, RetryResult,
};
