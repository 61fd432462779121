//! Platform resolution
//!
//! Decides which OS family code path a probe takes. The caller's override
//! wins over the host OS. Pure, no I/O.

use std::fmt;

/// OS family a probe targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    Linux,
    Darwin,
    FreeBsd,
    OpenBsd,
    NetBsd,
    SunOs,
}

impl Platform {
    /// Parse a platform name.
    ///
    /// Accepts both Rust (`std::env::consts::OS`) and Node-style names
    /// (`win32`, `sunos`), case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "win32" | "windows" => Some(Platform::Windows),
            "linux" | "android" => Some(Platform::Linux),
            "darwin" | "macos" => Some(Platform::Darwin),
            "freebsd" => Some(Platform::FreeBsd),
            "openbsd" => Some(Platform::OpenBsd),
            "netbsd" => Some(Platform::NetBsd),
            "sunos" | "solaris" | "illumos" => Some(Platform::SunOs),
            _ => None,
        }
    }

    /// Platform of the running process, if it is a supported family
    pub fn host() -> Option<Self> {
        Self::parse(std::env::consts::OS)
    }

    /// Resolve the platform for one call: override first, then the host
    ///
    /// An unrecognised override yields `None` rather than falling back to the
    /// host, so no OS-specific branch fires for it.
    pub fn resolve(override_name: Option<&str>) -> Option<Self> {
        match override_name.map(str::trim).filter(|s| !s.is_empty()) {
            Some(name) => Self::parse(name),
            None => Self::host(),
        }
    }

    /// Name used when forcing a platform into options
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "win32",
            Platform::Linux => "linux",
            Platform::Darwin => "darwin",
            Platform::FreeBsd => "freebsd",
            Platform::OpenBsd => "openbsd",
            Platform::NetBsd => "netbsd",
            Platform::SunOs => "sunos",
        }
    }

    /// Darwin, the BSDs and SunOS share the `route get` style tooling
    pub fn is_bsd_like(&self) -> bool {
        matches!(
            self,
            Platform::Darwin
                | Platform::FreeBsd
                | Platform::OpenBsd
                | Platform::NetBsd
                | Platform::SunOs
        )
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
