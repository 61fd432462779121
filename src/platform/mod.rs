//! Host-specific implementations of the core execution seams
//!
//! All process spawning, WinRM and OS interface enumeration lives here.

pub mod native;
pub mod shell;
pub mod winrm;

pub use native::IfAddrsSource;
pub use shell::LocalShell;
pub use winrm::{WinRmTransport, WindowsRemoteSession};

use crate::config::SysprobeConfig;
use crate::core::{InterfaceCache, ProbeRuntime, SystemProbes};
use std::sync::Arc;

/// Runtime backed by the real host: local shell, WinRM transport,
/// `if-addrs` and the process-wide interface cache
pub fn local_runtime(config: &SysprobeConfig) -> Arc<ProbeRuntime> {
    Arc::new(ProbeRuntime::new(
        Arc::new(LocalShell),
        Arc::new(WinRmTransport::new(config.retry())),
        Arc::new(IfAddrsSource),
        InterfaceCache::global(),
    ))
}

impl SystemProbes {
    /// Every built-in probe on the real host
    pub fn local(config: &SysprobeConfig) -> Self {
        SystemProbes::new(local_runtime(config))
    }
}
