//! Durable local storage port and an in-memory implementation

pub mod memory;
pub mod ports;

pub use memory::MemoryStore;
pub use ports::{load_json, save_json, LocalStore};
