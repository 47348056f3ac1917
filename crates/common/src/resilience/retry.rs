//! Bounded retry with exponential backoff.
//!
//! [`RetryExecutor`] drives any async operation through a [`RetryPolicy`]
//! that decides, per failure, whether another attempt is worthwhile.
//! [`with_retry`] is the entry point most callers want: it plugs in the
//! failure classification from [`super::classify`] so retryable failures are
//! retried with backoff and fatal failures surface on the first attempt.
//!
//! Delays are awaited with `tokio::time::sleep`, so tests can run the whole
//! backoff sequence on a paused clock.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::classify::{ClassifyFailure, FailureClass};

/// Terminal failure of a retried operation.
///
/// Both variants carry the last error produced by the operation so callers
/// can inspect or rethrow it.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// Every allowed attempt failed with a retryable error.
    #[error("all {attempts} retry attempts exhausted: {source}")]
    AttemptsExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Error from the final attempt.
        source: E,
    },

    /// The policy refused to retry this error.
    #[error("operation failed with non-retryable error: {source}")]
    NonRetryable {
        /// Error that stopped the sequence.
        source: E,
    },
}

impl<E> RetryError<E> {
    /// Unwrap the last error the operation produced.
    pub fn into_source(self) -> E {
        match self {
            Self::AttemptsExhausted { source, .. } | Self::NonRetryable { source } => source,
        }
    }

    /// Borrow the last error the operation produced.
    pub const fn source_ref(&self) -> &E {
        match self {
            Self::AttemptsExhausted { source, .. } | Self::NonRetryable { source } => source,
        }
    }

    /// True when the sequence stopped because attempts ran out.
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::AttemptsExhausted { .. })
    }
}

/// Invalid retry configuration rejected by [`RetryConfigBuilder::build`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid retry configuration: {message}")]
pub struct InvalidRetryConfig {
    /// What was wrong.
    pub message: String,
}

/// Result type for retry operations
pub type RetryResult<T, E> = Result<T, RetryError<E>>;

/// Result of a retry sequence plus the bookkeeping collected on the way.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    /// Final result.
    pub result: RetryResult<T, E>,
    /// Attempts made, including the successful one.
    pub attempts: u32,
    /// Sum of all backoff sleeps.
    pub total_delay: Duration,
    /// Display form of the most recent error, if any attempt failed.
    pub last_error: Option<String>,
}

impl<T, E> RetryOutcome<T, E> {
    /// Consume the outcome and return only the result.
    pub fn into_result(self) -> RetryResult<T, E> {
        self.result
    }

    /// Average sleep between attempts.
    pub fn average_delay(&self) -> Duration {
        if self.attempts <= 1 {
            return Duration::ZERO;
        }
        self.total_delay / (self.attempts - 1)
    }
}

/// Trait for determining whether an error should be retried
pub trait RetryPolicy<E> {
    /// Decide what to do after `error` on the zero-based `attempt`.
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision;
}

/// Decision for whether to retry an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the operation with the backoff delay
    Retry,
    /// Don't retry the operation
    Stop,
}

/// Backoff strategy for calculating retry delays
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed(Duration),
    /// `initial_delay * factor^attempt`, capped at `max_delay`
    Exponential {
        /// Delay before the first retry.
        initial_delay: Duration,
        /// Multiplier applied after each retry.
        factor: f64,
        /// Upper bound for any single delay.
        max_delay: Duration,
    },
}

impl BackoffStrategy {
    /// Delay to wait after the failure of the zero-based `attempt`.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed(delay) => *delay,
            Self::Exponential { initial_delay, factor, max_delay } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let delay_ms = initial_delay.as_millis() as f64 * factor.powi(exponent);
                let capped = delay_ms.min(max_delay.as_millis() as f64).max(0.0);
                Duration::from_millis(capped as u64)
            }
        }
    }
}

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts allowed, including the first.
    pub max_attempts: u32,
    /// Backoff strategy for calculating delays
    pub backoff: BackoffStrategy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffStrategy::Exponential {
                initial_delay: Duration::from_millis(1000),
                factor: 2.0,
                max_delay: Duration::from_millis(10_000),
            },
        }
    }
}

impl RetryConfig {
    /// Create a configuration builder
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), InvalidRetryConfig> {
        if self.max_attempts == 0 {
            return Err(InvalidRetryConfig {
                message: "max_attempts must be greater than 0".to_string(),
            });
        }

        if let BackoffStrategy::Exponential { factor, .. } = &self.backoff {
            if *factor < 1.0 {
                return Err(InvalidRetryConfig {
                    message: "backoff factor must be at least 1.0".to_string(),
                });
            }
        }

        Ok(())
    }
}

/// Builder for RetryConfig with fluent API
#[derive(Debug, Default)]
pub struct RetryConfigBuilder {
    config: RetryConfig,
}

impl RetryConfigBuilder {
    /// Start from the default configuration.
    pub fn new() -> Self {
        Self { config: RetryConfig::default() }
    }

    /// Total attempts allowed.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    /// Constant delay between attempts.
    pub fn fixed_backoff(mut self, delay: Duration) -> Self {
        self.config.backoff = BackoffStrategy::Fixed(delay);
        self
    }

    /// Exponential delay between attempts.
    pub fn exponential_backoff(
        mut self,
        initial_delay: Duration,
        factor: f64,
        max_delay: Duration,
    ) -> Self {
        self.config.backoff = BackoffStrategy::Exponential { initial_delay, factor, max_delay };
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<RetryConfig, InvalidRetryConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// The main retry executor
#[derive(Debug, Clone)]
pub struct RetryExecutor<P> {
    config: RetryConfig,
    policy: P,
}

impl<P> RetryExecutor<P> {
    /// Create a new retry executor with the given configuration and policy
    pub const fn new(config: RetryConfig, policy: P) -> Self {
        Self { config, policy }
    }

    /// Create with default configuration
    pub fn with_policy(policy: P) -> Self {
        Self::new(RetryConfig::default(), policy)
    }

    /// Configuration in effect.
    pub const fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Execute an operation with retry logic
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> RetryResult<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_with_outcome(operation).await.into_result()
    }

    /// Execute an operation with retry logic and return outcome statistics.
    pub async fn execute_with_outcome<F, Fut, T, E>(&self, operation: F) -> RetryOutcome<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_observed(operation, |_, _, _| {}).await
    }

    /// Execute an operation, calling `on_retry(attempt, error, delay)` once
    /// each backoff sleep has elapsed and before the next attempt. `attempt`
    /// is the one-based number of the attempt that just failed.
    #[instrument(skip_all, fields(max_attempts = self.config.max_attempts))]
    pub async fn execute_observed<F, Fut, T, E, O>(
        &self,
        mut operation: F,
        mut on_retry: O,
    ) -> RetryOutcome<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        O: FnMut(u32, &E, Duration),
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut total_delay = Duration::ZERO;
        let mut attempt: u32 = 0;

        loop {
            let attempt_number = attempt + 1;
            debug!(attempt = attempt_number, max_attempts, "executing operation");

            let error = match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(retries = attempt, "operation succeeded after retrying");
                    }
                    return RetryOutcome {
                        result: Ok(value),
                        attempts: attempt_number,
                        total_delay,
                        last_error: None,
                    };
                }
                Err(error) => error,
            };
            let description = error.to_string();

            let delay = match self.policy.should_retry(&error, attempt) {
                RetryDecision::Stop => {
                    debug!(attempt = attempt_number, error = %description, "error is not retryable");
                    return RetryOutcome {
                        result: Err(RetryError::NonRetryable { source: error }),
                        attempts: attempt_number,
                        total_delay,
                        last_error: Some(description),
                    };
                }
                RetryDecision::Retry => self.config.backoff.calculate_delay(attempt),
            };

            if attempt_number >= max_attempts {
                warn!(attempts = attempt_number, error = %description, "retry attempts exhausted");
                return RetryOutcome {
                    result: Err(RetryError::AttemptsExhausted {
                        attempts: attempt_number,
                        source: error,
                    }),
                    attempts: attempt_number,
                    total_delay,
                    last_error: Some(description),
                };
            }

            warn!(
                attempt = attempt_number,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %description,
                "operation failed, retrying"
            );
            tokio::time::sleep(delay).await;
            total_delay += delay;
            on_retry(attempt_number, &error, delay);
            attempt += 1;
        }
    }
}

/// Receives a user-facing notice when a retryable operation finally gives up.
pub trait FailureNotifier: Send + Sync {
    /// Show a transient failure notice.
    fn notify_failure(&self, message: &str);
}

/// Callback invoked after each backoff wait with the failed attempt number.
pub type OnRetry<E> = Arc<dyn Fn(u32, &E) + Send + Sync>;

/// Options accepted by [`with_retry`].
pub struct RetryOptions<E> {
    /// Total attempts allowed, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for any single delay.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub backoff_factor: f64,
    /// Called after each backoff wait, before the next attempt.
    pub on_retry: Option<OnRetry<E>>,
    /// Surface a notice through `notifier` when retries are exhausted.
    pub notify_user: bool,
    /// Destination for user-facing notices.
    pub notifier: Option<Arc<dyn FailureNotifier>>,
}

impl<E> Default for RetryOptions<E> {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            backoff_factor: 2.0,
            on_retry: None,
            notify_user: true,
            notifier: None,
        }
    }
}

impl<E> Clone for RetryOptions<E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            initial_delay: self.initial_delay,
            max_delay: self.max_delay,
            backoff_factor: self.backoff_factor,
            on_retry: self.on_retry.clone(),
            notify_user: self.notify_user,
            notifier: self.notifier.clone(),
        }
    }
}

impl<E> fmt::Debug for RetryOptions<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryOptions")
            .field("max_attempts", &self.max_attempts)
            .field("initial_delay", &self.initial_delay)
            .field("max_delay", &self.max_delay)
            .field("backoff_factor", &self.backoff_factor)
            .field("on_retry", &self.on_retry.is_some())
            .field("notify_user", &self.notify_user)
            .finish_non_exhaustive()
    }
}

impl<E> RetryOptions<E> {
    /// Executor configuration equivalent to these options.
    pub fn to_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts.max(1),
            backoff: BackoffStrategy::Exponential {
                initial_delay: self.initial_delay,
                factor: self.backoff_factor.max(1.0),
                max_delay: self.max_delay,
            },
        }
    }
}

/// Retries errors classified as retryable and stops on fatal ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifiedRetry;

impl<E: ClassifyFailure> RetryPolicy<E> for ClassifiedRetry {
    fn should_retry(&self, error: &E, _attempt: u32) -> RetryDecision {
        match error.failure_class() {
            FailureClass::Retryable => RetryDecision::Retry,
            FailureClass::Fatal => RetryDecision::Stop,
        }
    }
}

/// Run `operation` with classified retries.
///
/// Retryable failures are retried up to `options.max_attempts` times in total
/// with exponential backoff. Fatal failures are returned after the first
/// attempt. When retries run out the last error is returned and, if
/// `notify_user` is set, the configured notifier is told.
pub async fn with_retry<F, Fut, T, E>(operation: F, options: RetryOptions<E>) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: ClassifyFailure + fmt::Display,
{
    let executor = RetryExecutor::new(options.to_config(), ClassifiedRetry);
    let hook = options.on_retry.clone();
    let outcome = executor
        .execute_observed(operation, |attempt, error, _delay| {
            if let Some(hook) = &hook {
                hook(attempt, error);
            }
        })
        .await;

    match outcome.result {
        Ok(value) => Ok(value),
        Err(error) => {
            if error.is_exhausted() && options.notify_user {
                if let Some(notifier) = &options.notifier {
                    notifier.notify_failure(&format!(
                        "Operation failed after {} attempts: {}",
                        outcome.attempts,
                        error.source_ref()
                    ));
                }
            }
            Err(error.into_source())
        }
    }
}

/// Ready-made policies.
pub mod policies {
    use super::{RetryDecision, RetryPolicy};

    /// Retries every error.
    #[derive(Debug, Clone, Copy)]
    pub struct AlwaysRetry;

    impl<E> RetryPolicy<E> for AlwaysRetry {
        fn should_retry(&self, _error: &E, _attempt: u32) -> RetryDecision {
            RetryDecision::Retry
        }
    }

    /// Never retries.
    #[derive(Debug, Clone, Copy)]
    pub struct NeverRetry;

    impl<E> RetryPolicy<E> for NeverRetry {
        fn should_retry(&self, _error: &E, _attempt: u32) -> RetryDecision {
            RetryDecision::Stop
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for the retry executor and `with_retry`.

    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use super::policies::{AlwaysRetry, NeverRetry};
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct TestError {
        message: String,
        class: FailureClass,
    }

    impl TestError {
        fn transient() -> Self {
            Self { message: "network unavailable".into(), class: FailureClass::Retryable }
        }

        fn fatal() -> Self {
            Self { message: "permission denied".into(), class: FailureClass::Fatal }
        }
    }

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.message)
        }
    }

    impl ClassifyFailure for TestError {
        fn failure_class(&self) -> FailureClass {
            self.class
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    impl FailureNotifier for RecordingNotifier {
        fn notify_failure(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    /// Validates the exponential backoff schedule.
    ///
    /// Assertions:
    /// - Delays double from the initial delay.
    /// - Delays never exceed `max_delay`.
    #[test]
    fn test_exponential_backoff_caps_at_max_delay() {
        let strategy = BackoffStrategy::Exponential {
            initial_delay: Duration::from_millis(1000),
            factor: 2.0,
            max_delay: Duration::from_millis(10_000),
        };

        assert_eq!(strategy.calculate_delay(0), Duration::from_millis(1000));
        assert_eq!(strategy.calculate_delay(1), Duration::from_millis(2000));
        assert_eq!(strategy.calculate_delay(3), Duration::from_millis(8000));
        assert_eq!(strategy.calculate_delay(4), Duration::from_millis(10_000));
        assert_eq!(strategy.calculate_delay(40), Duration::from_millis(10_000));
    }

    /// Validates builder validation.
    ///
    /// Assertions:
    /// - Zero attempts is rejected.
    /// - A shrinking backoff factor is rejected.
    #[test]
    fn test_config_builder_rejects_invalid_values() {
        assert!(RetryConfig::builder().max_attempts(0).build().is_err());
        assert!(RetryConfig::builder()
            .exponential_backoff(Duration::from_millis(10), 0.5, Duration::from_secs(1))
            .build()
            .is_err());
        assert!(RetryConfig::builder().max_attempts(5).build().is_ok());
    }

    /// Validates the fail, fail, succeed scenario.
    ///
    /// Assertions:
    /// - The operation is called exactly 3 times.
    /// - The result is the success value.
    /// - `on_retry` fires for attempts 1 and 2.
    #[tokio::test(start_paused = true)]
    async fn test_with_retry_succeeds_on_third_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let retried = Arc::new(Mutex::new(Vec::new()));

        let retried_hook = Arc::clone(&retried);
        let options = RetryOptions {
            on_retry: Some(Arc::new(move |attempt: u32, _error: &TestError| {
                retried_hook.lock().unwrap().push(attempt);
            }) as OnRetry<TestError>),
            ..RetryOptions::default()
        };

        let calls_op = Arc::clone(&calls);
        let result = with_retry(
            move || {
                let calls = Arc::clone(&calls_op);
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    if n < 3 {
                        Err(TestError::transient())
                    } else {
                        Ok("done")
                    }
                }
            },
            options,
        )
        .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(*retried.lock().unwrap(), vec![1, 2]);
    }

    /// Validates that `on_retry` runs once the backoff wait is over.
    ///
    /// Assertions:
    /// - The first notice arrives after the 1000ms initial delay.
    /// - The second arrives after the doubled 2000ms delay on top of it.
    #[tokio::test(start_paused = true)]
    async fn test_on_retry_fires_after_backoff_wait() {
        let start = tokio::time::Instant::now();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_hook = Arc::clone(&seen);
        let options = RetryOptions {
            on_retry: Some(Arc::new(move |_attempt: u32, _error: &TestError| {
                seen_hook.lock().unwrap().push(start.elapsed());
            }) as OnRetry<TestError>),
            ..RetryOptions::default()
        };

        let result: Result<(), TestError> =
            with_retry(|| async { Err(TestError::transient()) }, options).await;
        assert!(result.is_err());

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 2);
        assert!(seen[0] >= Duration::from_millis(1000), "{seen:?}");
        assert!(seen[0] < Duration::from_millis(3000), "{seen:?}");
        assert!(seen[1] >= Duration::from_millis(3000), "{seen:?}");
    }

    /// Validates that fatal errors are not retried.
    ///
    /// Assertions:
    /// - The operation is called once.
    /// - The fatal error is returned unchanged.
    #[tokio::test(start_paused = true)]
    async fn test_with_retry_returns_fatal_error_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_op = Arc::clone(&calls);

        let result: Result<(), TestError> = with_retry(
            move || {
                calls_op.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError::fatal()) }
            },
            RetryOptions::default(),
        )
        .await;

        assert_eq!(result, Err(TestError::fatal()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    /// Validates exhaustion and user notification.
    ///
    /// Assertions:
    /// - The operation is called `max_attempts` times.
    /// - The notifier receives one message.
    /// - Total waited time is 1s + 2s on the paused clock.
    #[tokio::test(start_paused = true)]
    async fn test_with_retry_notifies_when_exhausted() {
        let calls = Arc::new(AtomicU32::new(0));
        let notifier = Arc::new(RecordingNotifier::default());
        let started = tokio::time::Instant::now();

        let calls_op = Arc::clone(&calls);
        let options = RetryOptions {
            notifier: Some(Arc::clone(&notifier) as Arc<dyn FailureNotifier>),
            ..RetryOptions::default()
        };
        let result: Result<(), TestError> = with_retry(
            move || {
                calls_op.fetch_add(1, Ordering::SeqCst);
                async { Err(TestError::transient()) }
            },
            options,
        )
        .await;

        assert_eq!(result, Err(TestError::transient()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(notifier.messages.lock().unwrap().len(), 1);
        assert_eq!(started.elapsed(), Duration::from_millis(3000));
    }

    /// Validates that `notify_user = false` stays silent.
    ///
    /// Assertions:
    /// - No message reaches the notifier.
    #[tokio::test(start_paused = true)]
    async fn test_with_retry_silent_when_notify_disabled() {
        let notifier = Arc::new(RecordingNotifier::default());
        let options = RetryOptions {
            notify_user: false,
            notifier: Some(Arc::clone(&notifier) as Arc<dyn FailureNotifier>),
            ..RetryOptions::default()
        };

        let result: Result<(), TestError> =
            with_retry(|| async { Err(TestError::transient()) }, options).await;

        assert!(result.is_err());
        assert!(notifier.messages.lock().unwrap().is_empty());
    }

    /// Validates executor outcome statistics.
    ///
    /// Assertions:
    /// - Attempts and total delay reflect a fixed backoff.
    /// - `NeverRetry` stops after one attempt.
    #[tokio::test(start_paused = true)]
    async fn test_executor_outcome_statistics() {
        let config = RetryConfig::builder()
            .max_attempts(4)
            .fixed_backoff(Duration::from_millis(50))
            .build()
            .unwrap();

        let outcome = RetryExecutor::new(config.clone(), AlwaysRetry)
            .execute_with_outcome(|| async { Err::<(), _>(TestError::transient()) })
            .await;
        assert_eq!(outcome.attempts, 4);
        assert_eq!(outcome.total_delay, Duration::from_millis(150));
        assert_eq!(outcome.average_delay(), Duration::from_millis(50));
        assert!(outcome.result.unwrap_err().is_exhausted());

        let outcome = RetryExecutor::new(config, NeverRetry)
            .execute_with_outcome(|| async { Err::<(), _>(TestError::transient()) })
            .await;
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.last_error.as_deref(), Some("network unavailable"));
    }

    /// Retries the first failure only.
    struct RetryFirstFailure;

    impl RetryPolicy<TestError> for RetryFirstFailure {
        fn should_retry(&self, _error: &TestError, attempt: u32) -> RetryDecision {
            if attempt == 0 {
                RetryDecision::Retry
            } else {
                RetryDecision::Stop
            }
        }
    }

    /// Validates that every retry waits the configured backoff.
    ///
    /// Assertions:
    /// - A `Retry` decision waits exactly one backoff delay.
    /// - A later `Stop` ends the run as non-retryable.
    #[tokio::test(start_paused = true)]
    async fn test_retry_decision_uses_backoff_delay() {
        let config = RetryConfig::builder()
            .max_attempts(5)
            .fixed_backoff(Duration::from_millis(50))
            .build()
            .unwrap();

        let outcome = RetryExecutor::new(config, RetryFirstFailure)
            .execute_with_outcome(|| async { Err::<(), _>(TestError::transient()) })
            .await;

        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.total_delay, Duration::from_millis(50));
        assert!(matches!(outcome.result, Err(RetryError::NonRetryable { .. })));
    }
}
