//! Probe library
//!
//! Each probe is an `async fn` taking a [`ProbeContext`], optionally a
//! parameter, and a [`Reply`](crate::core::Reply) it answers through. Probes
//! never decide where they run: the context routes commands to the local
//! shell or to a remote WinRM session.

pub mod network;
pub mod processes;
pub mod services;
pub mod system;

use crate::core::{Probe, ProbeContext, ProbeRegistry};
use crate::utils::ProbeError;
use serde::de::DeserializeOwned;

/// Run a PowerShell script on the target and parse its JSON output
///
/// Empty output parses as `null`, which is what `ConvertTo-Json` prints for
/// an empty pipeline.
pub(crate) async fn run_ps_json<T: DeserializeOwned>(
    ctx: &ProbeContext,
    script: &str,
    label: &str,
) -> Result<T, ProbeError> {
    let raw = ctx.powershell(script).await?;
    let trimmed = match raw.trim() {
        "" => "null",
        other => other,
    };
    serde_json::from_str(trimmed).map_err(|e| {
        ProbeError::Parse(format!("{}: failed to parse JSON: {} (raw: {})", label, e, trimmed))
    })
}

/// Run blocking collection (sysinfo refreshes) off the async workers
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ProbeError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ProbeError::Exec(format!("collection task failed: {}", e)))
}

/// Register every built-in probe with its call shape
pub fn register_builtin(registry: &mut ProbeRegistry) {
    registry
        .register(Probe::plain("network_interfaces", network::network_interfaces))
        .register(Probe::plain(
            "network_interface_default",
            network::network_interface_default,
        ))
        .register(Probe::plain(
            "network_gateway_default",
            network::network_gateway_default,
        ))
        .register(Probe::with_param("network_stats", network::network_stats))
        .register(Probe::plain(
            "network_connections",
            network::network_connections,
        ))
        .register(Probe::plain("os_info", system::os_info))
        .register(Probe::plain("cpu", system::cpu))
        .register(Probe::plain("mem", system::mem))
        .register(Probe::plain("time", system::time))
        .register(Probe::with_param("processes", processes::processes))
        .register(Probe::with_param("services", services::services));
}
