//! HTTP implementation of the remote backend

pub mod rest_backend;

pub use rest_backend::{RestBackend, RestBackendConfig};
