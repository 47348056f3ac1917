//! # CareLog API
//!
//! Application layer - commands, wiring and the daemon entry point.
//!
//! This crate contains:
//! - Commands over the sync and backup services
//! - Application context (dependency injection)
//! - Logging setup shared by the binary and tests
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core` and `infra`
//! - Wires the ports in `core` to the adapters in `infra`

pub mod commands;
pub mod context;
pub mod utils;

// Re-export for convenience
pub use commands::*;
pub use context::*;
