//! Execution seams: local commands, remote WinRM sessions, native interfaces
//!
//! Probes never spawn processes or open sessions themselves. They go through
//! these traits so tests can substitute scripted implementations.
//! Platform-specific implementations are in `src/platform/`.

use crate::models::WinRmConfig;
use crate::utils::{ProbeError, SessionError};
use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::Arc;

/// Runs command text and returns its standard output
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a shell one-liner (`sh -c` on unix, `cmd /C` on Windows)
    async fn run(&self, command: &str) -> Result<String, ProbeError>;

    /// Run a PowerShell script
    async fn run_powershell(&self, script: &str) -> Result<String, ProbeError>;
}

/// A session on a remote Windows host
///
/// Both `CommandRunner` methods execute on the remote host; `run` text is
/// interpreted by PowerShell there, which also accepts plain commands such
/// as `netstat -r`.
#[async_trait]
pub trait RemoteSession: CommandRunner {
    /// Host this session is connected to
    fn server_name(&self) -> &str;

    /// Execute a PowerShell script on the remote host
    ///
    /// SECURITY: callers must escape any user input embedded in `script`.
    async fn execute_powershell(&self, script: &str) -> Result<String, SessionError>;
}

/// Opens remote sessions from per-call configuration
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self, config: &WinRmConfig) -> Result<Arc<dyn RemoteSession>, ProbeError>;
}

/// One address of a host network interface as reported by the OS
#[derive(Debug, Clone, PartialEq)]
pub struct HostInterface {
    pub name: String,
    pub ip: IpAddr,
    pub netmask: Option<IpAddr>,
    /// Loopback
    pub internal: bool,
    /// IPv6 scope id; `None` for IPv4 entries
    pub scope_id: Option<u32>,
}

/// Source of OS-native interface descriptors for the local host
pub trait InterfaceSource: Send + Sync {
    fn interfaces(&self) -> Result<Vec<HostInterface>, ProbeError>;
}
