//! Network interface listing
//!
//! Locally the OS-native descriptors are grouped per interface. On a remote
//! Windows host `Get-NetIPAddress` is queried instead.

use crate::core::{HostInterface, ProbeContext, Reply};
use crate::normalize::{json_str, json_u64, normalize_array};
use crate::utils::ProbeError;
use serde::Serialize;
use serde_json::Value;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

const REMOTE_INTERFACES_SCRIPT: &str = r#"
Get-NetIPAddress -ErrorAction SilentlyContinue |
    Select-Object InterfaceAlias, IPAddress, PrefixLength, @{n='AddressFamily';e={[string]$_.AddressFamily}} |
    ConvertTo-Json -Compress
"#;

/// One network interface with its first IPv4 and IPv6 address
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InterfaceEntry {
    pub iface: String,
    #[serde(rename = "ifaceName")]
    pub iface_name: String,
    pub ip4: String,
    pub ip4subnet: String,
    pub ip6: String,
    pub ip6subnet: String,
    pub internal: bool,
}

impl InterfaceEntry {
    fn named(name: &str) -> Self {
        Self {
            iface: name.to_string(),
            iface_name: name.to_string(),
            ..Default::default()
        }
    }

    fn add_address(&mut self, ip: IpAddr, subnet: String) {
        match ip {
            IpAddr::V4(v4) if self.ip4.is_empty() => {
                self.ip4 = v4.to_string();
                self.ip4subnet = subnet;
            }
            IpAddr::V6(v6) if self.ip6.is_empty() => {
                self.ip6 = v6.to_string();
                self.ip6subnet = subnet;
            }
            _ => {}
        }
    }
}

/// Find the entry for `name`, creating it at the end when missing
fn entry_for<'a>(entries: &'a mut Vec<InterfaceEntry>, name: &str) -> &'a mut InterfaceEntry {
    let index = match entries.iter().position(|e| e.iface == name) {
        Some(index) => index,
        None => {
            entries.push(InterfaceEntry::named(name));
            entries.len() - 1
        }
    };
    &mut entries[index]
}

/// Group per-address descriptors into one entry per interface, in first-seen order
pub fn group_host_interfaces(interfaces: &[HostInterface]) -> Vec<InterfaceEntry> {
    let mut entries = Vec::new();
    for descriptor in interfaces {
        let entry = entry_for(&mut entries, &descriptor.name);
        let subnet = descriptor
            .netmask
            .map(|mask| mask.to_string())
            .unwrap_or_default();
        entry.add_address(descriptor.ip, subnet);
        entry.internal |= descriptor.internal;
    }
    entries
}

/// Dotted (IPv4) or colon (IPv6) netmask for a prefix length
pub fn prefix_to_netmask(prefix: u8, v6: bool) -> String {
    if v6 {
        let prefix = u32::from(prefix.min(128));
        let mask = u128::MAX.checked_shl(128 - prefix).unwrap_or(0);
        Ipv6Addr::from(mask).to_string()
    } else {
        let prefix = u32::from(prefix.min(32));
        let mask = u32::MAX.checked_shl(32 - prefix).unwrap_or(0);
        Ipv4Addr::from(mask).to_string()
    }
}

/// Parse `Get-NetIPAddress` JSON into interface entries
pub fn parse_remote_addresses(raw: &str) -> Result<Vec<InterfaceEntry>, ProbeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let value: Value = serde_json::from_str(trimmed)
        .map_err(|e| ProbeError::Parse(format!("Get-NetIPAddress: {}", e)))?;

    let mut entries = Vec::new();
    for item in normalize_array(value) {
        let alias = json_str(&item, "InterfaceAlias");
        let Ok(ip) = json_str(&item, "IPAddress").parse::<IpAddr>() else {
            continue;
        };
        let prefix = u8::try_from(json_u64(&item, "PrefixLength")).unwrap_or(0);
        let subnet = prefix_to_netmask(prefix, ip.is_ipv6());

        let entry = entry_for(&mut entries, &alias);
        entry.add_address(ip, subnet);
        entry.internal |= ip.is_loopback() || alias.starts_with("Loopback");
    }
    Ok(entries)
}

/// Interfaces of the call's target host
pub async fn list_interfaces(ctx: &ProbeContext) -> Result<Vec<InterfaceEntry>, ProbeError> {
    match ctx.native_interfaces() {
        Some(native) => Ok(group_host_interfaces(&native?)),
        None => {
            let raw = ctx.powershell(REMOTE_INTERFACES_SCRIPT).await?;
            parse_remote_addresses(&raw)
        }
    }
}

pub async fn network_interfaces(ctx: ProbeContext, reply: Reply) -> Result<(), ProbeError> {
    let interfaces = list_interfaces(&ctx).await?;
    reply.send(interfaces);
    Ok(())
}
