//! Probe composition framework (platform-agnostic)
//!
//! CRITICAL: This module MUST NOT import platform-specific code. Process
//! spawning, WinRM and OS interface enumeration enter through the traits in
//! [`session`].

pub mod adapter;
pub mod context;
pub mod facade;
pub mod options;
pub mod outcome;
pub mod platform;
pub mod registry;
pub mod remote;
pub mod safety;
pub mod session;

// Scripted collaborators (tests only)
#[cfg(test)]
pub mod mock_session;

pub use adapter::{adapt, AdaptedFuture, Probe, ProbeFuture, ProbeShape, Reply};
pub use context::{InterfaceCache, ProbeContext, ProbeRuntime};
pub use facade::SystemProbes;
pub use options::{remote_config_from_json, ProbeOptions};
pub use outcome::ProbeOutcome;
pub use platform::Platform;
pub use registry::ProbeRegistry;
pub use remote::{remote, remote_options, RemoteFuture};
pub use safety::{safe, SafeFuture};
pub use session::{CommandRunner, HostInterface, InterfaceSource, RemoteSession, SessionFactory};
