//! sysprobe - OS probes behind one async contract
//!
//! Any probe runs on the local host or, unchanged, against a remote Windows
//! host over WinRM. Every exported call resolves to a
//! [`ProbeOutcome`](core::ProbeOutcome) and never fails.

// Public modules
pub mod config;
pub mod constants;
pub mod core;
pub mod logger;
pub mod models;
pub mod normalize;
pub mod probes;
pub mod utils;

// Host-specific implementations
pub mod platform;

// Re-export commonly used types
pub use config::SysprobeConfig;
pub use core::{InterfaceCache, Platform, ProbeOptions, ProbeOutcome, ProbeRuntime, SystemProbes};
pub use models::{Credentials, SecureString, Username, WinRmConfig};
pub use utils::{CredentialError, ProbeError, SessionError};
