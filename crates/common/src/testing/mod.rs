//! Testing utilities and helpers
//!
//! - **[`time`]**: injectable wall clock with a mock for deterministic tests

pub mod time;

pub use time::{Clock, MockClock, SystemClock};
