//! Network probes

pub mod connections;
pub mod default_iface;
pub mod gateway;
pub mod interfaces;
pub mod stats;

pub use connections::{network_connections, Connection};
pub use default_iface::{network_interface_default, resolve, resolve_with_callback};
pub use gateway::network_gateway_default;
pub use interfaces::{network_interfaces, InterfaceEntry};
pub use stats::{network_stats, InterfaceStats};
