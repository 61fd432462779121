//! Default network interface resolution
//!
//! Combines OS-native interface state with the routing table as printed by
//! `netstat`, `ip` or `route`, depending on the platform. The last non-empty
//! answer is kept in the context's [`InterfaceCache`](crate::core::InterfaceCache)
//! and returned whenever a later attempt comes up empty.

use super::interfaces::list_interfaces;
use crate::constants::{
    BSD_DEFAULT_IFACE_CMD, DARWIN_DEFAULT_IFACE_CMD, LINUX_DEFAULT_ROUTE_CMD,
    NETSTAT_DEFAULT_ROUTE, REMOTE_DEFAULT_ROUTE_SCRIPT, REMOTE_ROUTE_ALIAS_KEY,
    WINDOWS_ROUTE_TABLE_CMD,
};
use crate::core::{HostInterface, Platform, ProbeContext, Reply};
use crate::normalize::{collapse_whitespace, first_line};
use crate::utils::ProbeError;

/// Preferred candidate from OS-native descriptors
///
/// Among non-internal descriptors, the one with the smallest non-zero scope
/// id wins; otherwise the first non-internal name seen.
pub fn pick_native_candidate(interfaces: &[HostInterface]) -> Option<String> {
    let mut first: Option<&str> = None;
    let mut scoped: Option<(u32, &str)> = None;

    for descriptor in interfaces.iter().filter(|d| !d.internal) {
        first.get_or_insert(descriptor.name.as_str());
        if let Some(scope) = descriptor.scope_id.filter(|s| *s != 0) {
            if scoped.map_or(true, |(best, _)| scope < best) {
                scoped = Some((scope, descriptor.name.as_str()));
            }
        }
    }

    scoped.map(|(_, name)| name).or(first).map(str::to_string)
}

/// IPv4 default route from `netstat -r`: `(gateway, local address)`
///
/// The last matching line wins. A line needs at least five fields.
pub fn parse_netstat_default_route(output: &str) -> Option<(String, String)> {
    let mut found = None;
    for line in output.lines() {
        let line = collapse_whitespace(line);
        if !line.contains(NETSTAT_DEFAULT_ROUTE) || line.chars().any(|c| c.is_ascii_alphabetic())
        {
            continue;
        }
        let fields: Vec<&str> = line.split(' ').collect();
        if fields.len() >= 5 {
            let n = fields.len();
            found = Some((fields[n - 3].to_string(), fields[n - 2].to_string()));
        }
    }
    found
}

/// Local IPv4 address of the default route in `netstat -r` output
pub fn parse_netstat_default_ip(output: &str) -> Option<String> {
    parse_netstat_default_route(output).map(|(_, local)| local)
}

/// Segment after the first `:`, up to the next one, trimmed
fn colon_segment(name: &str) -> String {
    name.split(':').nth(1).unwrap_or("").trim().to_string()
}

/// Interface name from the first line of `ip route | grep default`
///
/// `none` routes carry the device in the sixth field, everything else in the
/// fifth. Alias labels (`wlan0:1`) reduce to the part after the colon.
pub fn parse_linux_default_route(output: &str) -> Option<String> {
    let fields: Vec<&str> = first_line(output).split_whitespace().collect();
    let name = match fields.as_slice() {
        ["none", _, _, _, _, name, ..] => *name,
        [_, _, _, _, name, ..] => *name,
        _ => return None,
    };
    if name.contains(':') {
        Some(colon_segment(name))
    } else {
        Some(name.to_string())
    }
}

/// Interface name from the first line of `route get` output
pub fn parse_route_get_interface(output: &str) -> String {
    let line = first_line(output);
    if line.contains(':') {
        colon_segment(line)
    } else {
        line.to_string()
    }
}

/// `InterfaceAlias` value from `Format-List` output
pub fn parse_remote_alias(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        (key.trim() == REMOTE_ROUTE_ALIAS_KEY).then(|| value.trim().to_string())
    })
}

/// Run every applicable strategy, updating `candidate` as each succeeds
///
/// Returns at the first failure; whatever was assigned before it stays.
async fn discover(ctx: &ProbeContext, candidate: &mut String) -> Result<(), ProbeError> {
    if let Some(native) = ctx.native_interfaces() {
        *candidate = pick_native_candidate(&native?).unwrap_or_default();
    }

    match ctx.platform() {
        Some(Platform::Windows) => {
            let output = ctx.exec(WINDOWS_ROUTE_TABLE_CMD).await?;
            if let Some(local_ip) = parse_netstat_default_ip(&output) {
                let interfaces = list_interfaces(ctx).await?;
                if let Some(entry) = interfaces.iter().find(|e| e.ip4 == local_ip) {
                    *candidate = entry.iface.clone();
                }
            }
        }
        Some(Platform::Linux) => {
            let output = ctx.exec(LINUX_DEFAULT_ROUTE_CMD).await?;
            if let Some(name) = parse_linux_default_route(&output) {
                *candidate = name;
            }
        }
        Some(Platform::Darwin) => {
            let output = ctx.exec(DARWIN_DEFAULT_IFACE_CMD).await?;
            *candidate = parse_route_get_interface(&output);
        }
        Some(platform) if platform.is_bsd_like() => {
            let output = ctx.exec(BSD_DEFAULT_IFACE_CMD).await?;
            *candidate = parse_route_get_interface(&output);
        }
        _ => {}
    }
    Ok(())
}

/// Name of the default interface, or the cached one when nothing resolves
///
/// Never fails. Errors end the attempt early and are only logged.
pub async fn resolve(ctx: &ProbeContext) -> String {
    let mut candidate = String::new();
    if let Err(err) = discover(ctx, &mut candidate).await {
        tracing::debug!(platform = %ctx.platform_label(), "default interface lookup stopped: {}", err);
    }

    if ctx.cache().store(&candidate) {
        tracing::debug!(iface = %candidate, "default interface updated");
    }
    ctx.cache().get()
}

/// Default route alias as reported by the remote host itself
///
/// Empty on any failure. Never touches the cache, which only holds names
/// of the local host.
pub async fn resolve_remote(ctx: &ProbeContext) -> String {
    match ctx.powershell(REMOTE_DEFAULT_ROUTE_SCRIPT).await {
        Ok(output) => parse_remote_alias(&output).unwrap_or_default(),
        Err(err) => {
            tracing::warn!("remote default interface lookup failed: {}", err);
            String::new()
        }
    }
}

/// Resolve and hand the result to `callback` exactly once
///
/// Remote hosts are asked for their default route directly. That answer is
/// not cached.
pub async fn resolve_with_callback<F>(ctx: &ProbeContext, callback: F) -> String
where
    F: FnOnce(String),
{
    let name = if ctx.is_remote() {
        resolve_remote(ctx).await
    } else {
        resolve(ctx).await
    };

    callback(name.clone());
    name
}

pub async fn network_interface_default(ctx: ProbeContext, reply: Reply) -> Result<(), ProbeError> {
    resolve_with_callback(&ctx, |name| reply.send(name)).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mock_session::{
        host_iface, runtime_parts, MockRemoteSession, MockTransport, ScriptedShell,
        StaticInterfaces,
    };
    use crate::core::{InterfaceCache, ProbeOptions};
    use crate::models::{SecureString, WinRmConfig};
    use std::sync::{Arc, Mutex};

    async fn local_ctx(
        platform: Option<Platform>,
        shell: Arc<ScriptedShell>,
        native: StaticInterfaces,
        cache: InterfaceCache,
    ) -> ProbeContext {
        let runtime = runtime_parts(shell, Arc::new(MockTransport::unreachable()), native, cache);
        let options = match platform {
            Some(p) => ProbeOptions::with_platform(p),
            None => ProbeOptions {
                platform: Some("plan9".into()),
                remote: None,
            },
        };
        runtime.context(options).await.unwrap()
    }

    fn remote_options() -> ProbeOptions {
        let mut options = ProbeOptions::with_platform(Platform::Windows);
        options.remote = Some(WinRmConfig::new("srv01", 5985, "admin", SecureString::new("pw")));
        options
    }

    #[test]
    fn smallest_nonzero_scope_wins() {
        let interfaces = vec![
            host_iface("lo", "::1", true, Some(1)),
            host_iface("eth0", "192.168.1.5", false, None),
            host_iface("eth0", "fe80::1", false, Some(0)),
            host_iface("wlan0", "fe80::2", false, Some(7)),
            host_iface("eth1", "fe80::3", false, Some(3)),
        ];
        assert_eq!(pick_native_candidate(&interfaces).as_deref(), Some("eth1"));
    }

    #[test]
    fn first_external_name_is_the_fallback() {
        let interfaces = vec![
            host_iface("lo", "127.0.0.1", true, None),
            host_iface("eth0", "192.168.1.5", false, None),
            host_iface("eth1", "10.0.0.5", false, Some(0)),
        ];
        assert_eq!(pick_native_candidate(&interfaces).as_deref(), Some("eth0"));
        assert_eq!(pick_native_candidate(&[host_iface("lo", "127.0.0.1", true, None)]), None);
    }

    #[test]
    fn netstat_default_route_line() {
        let output = "\
Active Routes:
Network Destination        Netmask          Gateway       Interface  Metric
          0.0.0.0          0.0.0.0         10.0.0.1       10.0.0.5     25
        127.0.0.0        255.0.0.0         On-link       127.0.0.1    331
";
        assert_eq!(parse_netstat_default_ip(output).as_deref(), Some("10.0.0.5"));
        assert_eq!(
            parse_netstat_default_route("0.0.0.0 0.0.0.0 10.0.0.1 10.0.0.5 25"),
            Some(("10.0.0.1".to_string(), "10.0.0.5".to_string()))
        );
    }

    #[test]
    fn netstat_requires_five_fields_and_no_letters() {
        assert_eq!(parse_netstat_default_ip("0.0.0.0 0.0.0.0 10.0.0.1 25"), None);
        assert_eq!(parse_netstat_default_ip("0.0.0.0 0.0.0.0 On-link 10.0.0.5 25"), None);
        let two_routes = "0.0.0.0 0.0.0.0 10.0.0.1 10.0.0.5 25\r\n0.0.0.0 0.0.0.0 10.1.0.1 10.1.0.5 50\r\n";
        assert_eq!(parse_netstat_default_ip(two_routes).as_deref(), Some("10.1.0.5"));
    }

    #[test]
    fn linux_default_route() {
        assert_eq!(
            parse_linux_default_route("default via 192.168.1.1 dev eth0 proto dhcp metric 100\n")
                .as_deref(),
            Some("eth0")
        );
        assert_eq!(
            parse_linux_default_route("none default via 10.0.0.1 dev wlan0:1").as_deref(),
            Some("1")
        );
        assert_eq!(parse_linux_default_route("default dev"), None);
        assert_eq!(parse_linux_default_route(""), None);
    }

    #[test]
    fn route_get_interface_line() {
        assert_eq!(parse_route_get_interface("  interface: em0\n"), "em0");
        assert_eq!(parse_route_get_interface("en0\n"), "en0");
        assert_eq!(parse_route_get_interface(""), "");
    }

    #[test]
    fn remote_alias_from_format_list() {
        let output = "\r\nInterfaceAlias : Ethernet 2\r\nInterfaceIndex : 12\r\nNextHop        : 10.0.0.1\r\n";
        assert_eq!(parse_remote_alias(output).as_deref(), Some("Ethernet 2"));
        assert_eq!(parse_remote_alias("NextHop : 10.0.0.1"), None);
    }

    #[tokio::test]
    async fn resolve_returns_a_string_for_every_platform() {
        let platforms = [
            Some(Platform::Windows),
            Some(Platform::Linux),
            Some(Platform::Darwin),
            Some(Platform::FreeBsd),
            Some(Platform::OpenBsd),
            Some(Platform::NetBsd),
            Some(Platform::SunOs),
            None,
        ];
        for platform in platforms {
            let ctx = local_ctx(
                platform,
                Arc::new(ScriptedShell::new()),
                StaticInterfaces::failing(),
                InterfaceCache::new(),
            )
            .await;
            assert_eq!(resolve(&ctx).await, "");
        }
    }

    #[tokio::test]
    async fn linux_route_overrides_native_candidate() {
        let shell = Arc::new(ScriptedShell::new().on(
            "ip route",
            "default via 192.168.1.1 dev eth0 proto dhcp metric 100\n",
        ));
        let native = StaticInterfaces::new(vec![host_iface("wlan0", "192.168.1.9", false, None)]);
        let ctx = local_ctx(Some(Platform::Linux), shell, native, InterfaceCache::new()).await;
        assert_eq!(resolve(&ctx).await, "eth0");
    }

    #[tokio::test]
    async fn cache_is_sticky_when_later_attempts_find_nothing() {
        let shell = Arc::new(ScriptedShell::new().on(
            "ip route",
            "default via 192.168.1.1 dev eth0 proto dhcp metric 100\n",
        ));
        let cache = InterfaceCache::new();
        let ctx = local_ctx(Some(Platform::Linux), shell.clone(), StaticInterfaces::default(), cache.clone()).await;

        assert_eq!(resolve(&ctx).await, "eth0");
        shell.set("ip route", "");
        assert_eq!(resolve(&ctx).await, "eth0");
        assert_eq!(cache.get(), "eth0");
    }

    #[tokio::test]
    async fn failure_keeps_candidate_found_before_it() {
        let shell = Arc::new(ScriptedShell::new().failing("ip route", "ip: not found"));
        let native = StaticInterfaces::new(vec![host_iface("enp3s0", "10.1.1.1", false, None)]);
        let ctx = local_ctx(Some(Platform::Linux), shell, native, InterfaceCache::new()).await;
        assert_eq!(resolve(&ctx).await, "enp3s0");
    }

    #[tokio::test]
    async fn empty_bsd_output_falls_back_to_cache() {
        let shell = Arc::new(ScriptedShell::new().on("route get", ""));
        let native = StaticInterfaces::new(vec![host_iface("em0", "10.1.1.1", false, None)]);
        let cache = InterfaceCache::new();
        cache.store("re0");
        let ctx = local_ctx(Some(Platform::FreeBsd), shell, native, cache).await;
        assert_eq!(resolve(&ctx).await, "re0");
    }

    #[tokio::test]
    async fn darwin_route_overrides_native_candidate() {
        let shell = Arc::new(ScriptedShell::new().on("route -n get default", "en0\n"));
        let native = StaticInterfaces::new(vec![host_iface("wlan0", "192.168.1.9", false, None)]);
        let cache = InterfaceCache::new();
        let ctx = local_ctx(Some(Platform::Darwin), shell, native, cache.clone()).await;
        assert_eq!(resolve(&ctx).await, "en0");
        assert_eq!(cache.get(), "en0");
    }

    #[tokio::test]
    async fn windows_matches_netstat_address_to_interface() {
        let shell = Arc::new(
            ScriptedShell::new().on("netstat -r", "0.0.0.0 0.0.0.0 10.0.0.1 10.0.0.5 25\n"),
        );
        let native = StaticInterfaces::new(vec![
            host_iface("Wi-Fi", "192.168.0.4", false, None),
            host_iface("Ethernet", "10.0.0.5", false, None),
        ]);
        let ctx = local_ctx(Some(Platform::Windows), shell, native, InterfaceCache::new()).await;
        assert_eq!(resolve(&ctx).await, "Ethernet");
    }

    #[tokio::test]
    async fn remote_callback_reads_interface_alias_without_caching() {
        let session = MockRemoteSession::new(
            "SRV01",
            ScriptedShell::new().on("Get-NetRoute", "InterfaceAlias : Ethernet0\r\nNextHop : 10.0.0.1\r\n"),
        );
        let cache = InterfaceCache::new();
        let runtime = runtime_parts(
            Arc::new(ScriptedShell::new()),
            Arc::new(MockTransport::with_session(session)),
            StaticInterfaces::default(),
            cache.clone(),
        );
        let ctx = runtime.context(remote_options()).await.unwrap();

        let calls = Arc::new(Mutex::new(Vec::new()));
        let record = calls.clone();
        let name = resolve_with_callback(&ctx, move |n| record.lock().unwrap().push(n)).await;

        assert_eq!(name, "Ethernet0");
        assert_eq!(*calls.lock().unwrap(), vec!["Ethernet0".to_string()]);
        assert_eq!(cache.get(), "");
    }

    #[tokio::test]
    async fn remote_callback_failure_yields_empty_name_once() {
        let session = MockRemoteSession::new(
            "SRV01",
            ScriptedShell::new().failing("Get-NetRoute", "Access is denied"),
        );
        let runtime = runtime_parts(
            Arc::new(ScriptedShell::new()),
            Arc::new(MockTransport::with_session(session)),
            StaticInterfaces::default(),
            InterfaceCache::new(),
        );
        let ctx = runtime.context(remote_options()).await.unwrap();

        let count = Arc::new(Mutex::new(0));
        let counter = count.clone();
        let name = resolve_with_callback(&ctx, move |_| *counter.lock().unwrap() += 1).await;
        assert_eq!(name, "");
        assert_eq!(*count.lock().unwrap(), 1);
    }
}
