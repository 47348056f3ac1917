//! Application state persisted through the local store

pub mod local_state;

pub use local_state::LocalStateStore;
