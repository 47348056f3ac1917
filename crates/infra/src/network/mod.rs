//! Connectivity detection

pub mod connectivity;

pub use connectivity::{ConnectivityMonitor, ConnectivityMonitorConfig};
