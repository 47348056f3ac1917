//! Wall-clock abstraction.
//!
//! Services stamp records through a [`Clock`] instead of calling
//! `Utc::now()` directly, so tests can pin and advance time.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use carelog_common::testing::{Clock, MockClock};
//!
//! let mock = MockClock::new();
//! let start = mock.now_utc();
//! mock.advance(Duration::from_secs(5));
//! assert_eq!((mock.now_utc() - start).num_seconds(), 5);
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

/// Source of the current UTC time.
pub trait Clock: Send + Sync {
    /// Current wall-clock time.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for deterministic tests.
///
/// Clones share the same time.
#[derive(Debug, Clone)]
pub struct MockClock {
    current: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    /// Clock starting at the real current time.
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Clock starting at `start`.
    pub fn at(start: DateTime<Utc>) -> Self {
        Self { current: Arc::new(Mutex::new(start)) }
    }

    /// Clock starting at the given UNIX timestamp in milliseconds.
    ///
    /// Out-of-range values fall back to the epoch.
    pub fn at_millis(millis: i64) -> Self {
        Self::at(Utc.timestamp_millis_opt(millis).single().unwrap_or_default())
    }

    /// Move time forward.
    pub fn advance(&self, duration: Duration) {
        let delta = chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX);
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        *current = current.checked_add_signed(delta).unwrap_or(*current);
    }

    /// Jump to an absolute time.
    pub fn set(&self, time: DateTime<Utc>) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = time;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for testing::time.
    use super::*;

    /// Validates the system clock scenario.
    ///
    /// Assertions:
    /// - Ensures `millis > 0` evaluates to true.
    #[test]
    fn test_system_clock_millis() {
        let clock = SystemClock;
        assert!(clock.now_utc().timestamp_millis() > 0);
    }

    /// Validates `MockClock::advance` and clone sharing.
    ///
    /// Assertions:
    /// - Advancing one clone is visible in the other.
    #[test]
    fn test_mock_clock_clone_shares_time() {
        let clock1 = MockClock::at_millis(1_000);
        let clock2 = clock1.clone();

        clock1.advance(Duration::from_millis(500));
        assert_eq!(clock2.now_utc().timestamp_millis(), 1_500);
    }

    /// Validates `MockClock::set`.
    ///
    /// Assertions:
    /// - The clock reports exactly the time it was set to.
    #[test]
    fn test_mock_clock_set() {
        let clock = MockClock::new();
        let target = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        clock.set(target);
        assert_eq!(clock.now_utc(), target);
    }
}
