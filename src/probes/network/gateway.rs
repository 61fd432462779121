//! IPv4 default gateway

use super::default_iface::parse_netstat_default_route;
use crate::constants::{
    BSD_DEFAULT_GATEWAY_CMD, DARWIN_DEFAULT_GATEWAY_CMD, LINUX_DEFAULT_ROUTE_CMD,
    REMOTE_DEFAULT_GATEWAY_SCRIPT, WINDOWS_ROUTE_TABLE_CMD,
};
use crate::core::{Platform, ProbeContext, Reply};
use crate::normalize::{after_colon, first_line};
use crate::utils::ProbeError;

/// Token following `via` on the first default route line
pub fn parse_linux_gateway(output: &str) -> Option<String> {
    let mut fields = first_line(output).split_whitespace();
    fields.find(|f| *f == "via")?;
    fields.next().map(str::to_string)
}

/// Value of the first `gateway:` line from `route get`
pub fn parse_route_get_gateway(output: &str) -> Option<String> {
    output
        .lines()
        .find(|line| line.trim_start().starts_with("gateway:"))
        .map(after_colon)
        .filter(|g| !g.is_empty())
}

pub async fn default_gateway(ctx: &ProbeContext) -> Result<String, ProbeError> {
    let gateway = match ctx.platform() {
        Some(Platform::Windows) if ctx.is_remote() => {
            let output = ctx.powershell(REMOTE_DEFAULT_GATEWAY_SCRIPT).await?;
            Some(first_line(&output).to_string()).filter(|g| !g.is_empty())
        }
        Some(Platform::Windows) => {
            let output = ctx.exec(WINDOWS_ROUTE_TABLE_CMD).await?;
            parse_netstat_default_route(&output).map(|(gateway, _)| gateway)
        }
        Some(Platform::Linux) => parse_linux_gateway(&ctx.exec(LINUX_DEFAULT_ROUTE_CMD).await?),
        Some(Platform::Darwin) => {
            parse_route_get_gateway(&ctx.exec(DARWIN_DEFAULT_GATEWAY_CMD).await?)
        }
        Some(platform) if platform.is_bsd_like() => {
            parse_route_get_gateway(&ctx.exec(BSD_DEFAULT_GATEWAY_CMD).await?)
        }
        _ => None,
    };
    Ok(gateway.unwrap_or_default())
}

pub async fn network_gateway_default(ctx: ProbeContext, reply: Reply) -> Result<(), ProbeError> {
    let gateway = default_gateway(&ctx).await?;
    reply.send(gateway);
    Ok(())
}
