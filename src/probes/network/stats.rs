//! Per-interface traffic counters

use super::default_iface::{resolve, resolve_remote};
use crate::core::{Platform, ProbeContext, Reply};
use crate::normalize::{json_str, json_u64, normalize_iface_name};
use crate::utils::ProbeError;
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

const LINUX_COUNTER_FILES: [&str; 7] = [
    "operstate",
    "statistics/rx_bytes",
    "statistics/rx_dropped",
    "statistics/rx_errors",
    "statistics/tx_bytes",
    "statistics/tx_dropped",
    "statistics/tx_errors",
];

/// Counters of one interface at one moment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceStats {
    pub iface: String,
    pub operstate: String,
    pub rx_bytes: u64,
    pub rx_dropped: u64,
    pub rx_errors: u64,
    pub tx_bytes: u64,
    pub tx_dropped: u64,
    pub tx_errors: u64,
    /// Milliseconds spent collecting
    pub ms: u64,
}

impl InterfaceStats {
    fn unknown(iface: &str) -> Self {
        Self {
            iface: iface.to_string(),
            operstate: "unknown".to_string(),
            rx_bytes: 0,
            rx_dropped: 0,
            rx_errors: 0,
            tx_bytes: 0,
            tx_dropped: 0,
            tx_errors: 0,
            ms: 0,
        }
    }
}

fn linux_stats_cmd(iface: &str) -> String {
    format!(
        "cd '/sys/class/net/{}' 2>/dev/null && for f in {}; do cat \"$f\" 2>/dev/null || echo; done",
        iface,
        LINUX_COUNTER_FILES.join(" ")
    )
}

fn windows_stats_script(iface: &str) -> String {
    format!(
        r#"$a = Get-NetAdapter -Name '{0}' -ErrorAction Stop
$s = Get-NetAdapterStatistics -Name '{0}' -ErrorAction Stop
[pscustomobject]@{{
    status = [string]$a.Status
    rx_bytes = $s.ReceivedBytes
    rx_dropped = $s.ReceivedDiscardedPackets
    rx_errors = $s.ReceivedPacketErrors
    tx_bytes = $s.SentBytes
    tx_dropped = $s.OutboundDiscardedPackets
    tx_errors = $s.OutboundPacketErrors
}} | ConvertTo-Json -Compress"#,
        iface
    )
}

fn bsd_stats_cmd(iface: &str) -> String {
    format!("netstat -ibndI '{}' 2>/dev/null", iface)
}

/// One value per line, in [`LINUX_COUNTER_FILES`] order
pub fn parse_linux_counters(iface: &str, output: &str) -> InterfaceStats {
    let mut stats = InterfaceStats::unknown(iface);
    let mut lines = output.lines().map(str::trim);

    if let Some(state) = lines.next().filter(|s| !s.is_empty()) {
        stats.operstate = state.to_string();
    }
    let mut counter = || -> u64 { lines.next().and_then(|v| v.parse().ok()).unwrap_or(0) };
    stats.rx_bytes = counter();
    stats.rx_dropped = counter();
    stats.rx_errors = counter();
    stats.tx_bytes = counter();
    stats.tx_dropped = counter();
    stats.tx_errors = counter();
    stats
}

/// `Get-NetAdapter` status mapped onto Linux operstate names
fn windows_operstate(status: &str) -> String {
    match status.to_ascii_lowercase().as_str() {
        "up" => "up".to_string(),
        "disconnected" | "down" | "disabled" => "down".to_string(),
        "" => "unknown".to_string(),
        other => other.to_string(),
    }
}

pub fn parse_windows_counters(iface: &str, output: &str) -> Result<InterfaceStats, ProbeError> {
    let value: Value = serde_json::from_str(output.trim())
        .map_err(|e| ProbeError::Parse(format!("Get-NetAdapterStatistics: {}", e)))?;
    Ok(InterfaceStats {
        iface: iface.to_string(),
        operstate: windows_operstate(&json_str(&value, "status")),
        rx_bytes: json_u64(&value, "rx_bytes"),
        rx_dropped: json_u64(&value, "rx_dropped"),
        rx_errors: json_u64(&value, "rx_errors"),
        tx_bytes: json_u64(&value, "tx_bytes"),
        tx_dropped: json_u64(&value, "tx_dropped"),
        tx_errors: json_u64(&value, "tx_errors"),
        ms: 0,
    })
}

/// `netstat -ibnd` output, columns located by header name
///
/// Uses the first row for `iface` that has as many fields as the header.
pub fn parse_bsd_counters(iface: &str, output: &str) -> InterfaceStats {
    let mut stats = InterfaceStats::unknown(iface);
    let mut lines = output.lines();
    let Some(header) = lines.next() else {
        return stats;
    };
    let columns: Vec<&str> = header.split_whitespace().collect();
    let Some(row) = lines
        .map(|l| l.split_whitespace().collect::<Vec<_>>())
        .find(|fields| fields.len() == columns.len() && fields.first() == Some(&iface))
    else {
        return stats;
    };

    let field = |names: &[&str]| -> u64 {
        columns
            .iter()
            .position(|c| names.contains(c))
            .and_then(|i| row[i].parse().ok())
            .unwrap_or(0)
    };
    stats.operstate = "up".to_string();
    stats.rx_bytes = field(&["Ibytes"]);
    stats.rx_errors = field(&["Ierrs"]);
    stats.rx_dropped = field(&["Idrop"]);
    stats.tx_bytes = field(&["Obytes"]);
    stats.tx_errors = field(&["Oerrs"]);
    stats.tx_dropped = field(&["Drop", "Odrop"]);
    stats
}

pub async fn interface_stats(
    ctx: &ProbeContext,
    iface: Option<String>,
) -> Result<InterfaceStats, ProbeError> {
    let started = Instant::now();
    let iface = match iface.filter(|i| !i.trim().is_empty()) {
        Some(name) => normalize_iface_name(&name).map_err(ProbeError::InvalidOption)?,
        None if ctx.is_remote() => resolve_remote(ctx).await,
        None => resolve(ctx).await,
    };
    if iface.is_empty() {
        return Ok(InterfaceStats::unknown(""));
    }
    // Cached names come from command output; check them the same way.
    let iface = normalize_iface_name(&iface).map_err(ProbeError::InvalidOption)?;

    let mut stats = match ctx.platform() {
        Some(Platform::Linux) => parse_linux_counters(&iface, &ctx.exec(&linux_stats_cmd(&iface)).await?),
        Some(Platform::Windows) => {
            parse_windows_counters(&iface, &ctx.powershell(&windows_stats_script(&iface)).await?)?
        }
        Some(platform) if platform.is_bsd_like() => {
            parse_bsd_counters(&iface, &ctx.exec(&bsd_stats_cmd(&iface)).await?)
        }
        _ => {
            return Err(ProbeError::Unsupported {
                probe: "network_stats",
                platform: ctx.platform_label(),
            })
        }
    };
    stats.ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    Ok(stats)
}

pub async fn network_stats(
    ctx: ProbeContext,
    iface: Option<String>,
    reply: Reply,
) -> Result<(), ProbeError> {
    let stats = interface_stats(&ctx, iface).await?;
    reply.send(stats);
    Ok(())
}
