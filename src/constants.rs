//! # Application-Wide Constants
//!
//! Commands, scripts and limits shared across the probe library and the
//! platform backends. Keeping the command text here makes it easy to see
//! exactly what sysprobe runs on a host.

/// Windows API flag to create a process without a visible console window
#[cfg(windows)]
pub const CREATE_NO_WINDOW: u32 = 0x08000000;

// ============================================================================
// Remote transport
// ============================================================================

/// WinRM HTTP listener port
pub const DEFAULT_WINRM_PORT: u16 = 5985;

/// Longest remote error snippet kept when no friendlier message matches
pub const MAX_REMOTE_ERROR_LEN: usize = 4000;

// ============================================================================
// Default interface resolution
// ============================================================================

/// Destination/netmask pair of the IPv4 default route in `netstat -r`
pub const NETSTAT_DEFAULT_ROUTE: &str = "0.0.0.0 0.0.0.0";

pub const WINDOWS_ROUTE_TABLE_CMD: &str = "netstat -r";

pub const LINUX_DEFAULT_ROUTE_CMD: &str = "ip route 2>/dev/null | grep default";

pub const DARWIN_DEFAULT_IFACE_CMD: &str =
    "route -n get default 2>/dev/null | grep interface: | awk '{print $2}'";

/// FreeBSD, OpenBSD, NetBSD and SunOS
pub const BSD_DEFAULT_IFACE_CMD: &str = "route get 0.0.0.0 | grep interface:";

pub const REMOTE_DEFAULT_ROUTE_SCRIPT: &str = r#"Get-NetRoute -DestinationPrefix "0.0.0.0/0" | Select-Object -First 1 | Format-List -Property InterfaceAlias, InterfaceIndex, NextHop"#;

/// Property name read from [`REMOTE_DEFAULT_ROUTE_SCRIPT`] output
pub const REMOTE_ROUTE_ALIAS_KEY: &str = "InterfaceAlias";

// ============================================================================
// Default gateway
// ============================================================================

pub const DARWIN_DEFAULT_GATEWAY_CMD: &str = "route -n get default 2>/dev/null | grep gateway:";

pub const BSD_DEFAULT_GATEWAY_CMD: &str = "route -n get 0.0.0.0 2>/dev/null | grep gateway:";

pub const REMOTE_DEFAULT_GATEWAY_SCRIPT: &str = r#"Get-NetRoute -DestinationPrefix "0.0.0.0/0" | Sort-Object RouteMetric | Select-Object -First 1 -ExpandProperty NextHop"#;

// ============================================================================
// Connections
// ============================================================================

pub const LINUX_CONNECTIONS_CMD: &str = "ss -tunap 2>/dev/null";

pub const WINDOWS_CONNECTIONS_CMD: &str = "netstat -ano";

pub const BSD_CONNECTIONS_CMD: &str = "netstat -an 2>/dev/null";

// ============================================================================
// Services
// ============================================================================

pub const LINUX_SERVICES_CMD: &str =
    "systemctl list-units --type=service --all --no-legend --plain 2>/dev/null";

pub const DARWIN_SERVICES_CMD: &str = "launchctl list 2>/dev/null";

// ============================================================================
// Limits
// ============================================================================

/// Longest interface name accepted before embedding it in a command
pub const MAX_IFACE_NAME_LEN: usize = 64;
