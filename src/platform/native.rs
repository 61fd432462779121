//! OS-native interface enumeration via `if-addrs`

use crate::core::{HostInterface, InterfaceSource};
use crate::utils::ProbeError;
use if_addrs::{IfAddr, Interface};
use std::net::{IpAddr, Ipv6Addr};

/// Local interfaces as reported by `getifaddrs` / `GetAdaptersAddresses`
#[derive(Debug, Default, Clone, Copy)]
pub struct IfAddrsSource;

/// fe80::/10
fn is_link_local_v6(ip: &Ipv6Addr) -> bool {
    (ip.segments()[0] & 0xffc0) == 0xfe80
}

fn to_host_interface(iface: Interface) -> HostInterface {
    let internal = iface.is_loopback();
    let (ip, netmask, scope_id) = match iface.addr {
        IfAddr::V4(v4) => (IpAddr::V4(v4.ip), Some(IpAddr::V4(v4.netmask)), None),
        IfAddr::V6(v6) => {
            // Link-local addresses are scoped to their interface; global ones carry scope 0.
            let scope = if is_link_local_v6(&v6.ip) {
                iface.index.unwrap_or(0)
            } else {
                0
            };
            (IpAddr::V6(v6.ip), Some(IpAddr::V6(v6.netmask)), Some(scope))
        }
    };

    HostInterface {
        name: iface.name,
        ip,
        netmask,
        internal,
        scope_id,
    }
}

impl InterfaceSource for IfAddrsSource {
    fn interfaces(&self) -> Result<Vec<HostInterface>, ProbeError> {
        let interfaces = if_addrs::get_if_addrs()
            .map_err(|e| ProbeError::Exec(format!("Failed to enumerate interfaces: {}", e)))?;
        Ok(interfaces.into_iter().map(to_host_interface).collect())
    }
}
