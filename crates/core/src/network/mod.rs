//! Network availability port and a host-driven implementation

pub mod manual;
pub mod ports;

pub use manual::ManualNetwork;
pub use ports::NetworkMonitor;
