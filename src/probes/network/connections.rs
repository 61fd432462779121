//! Open sockets and their peers

use crate::constants::{BSD_CONNECTIONS_CMD, LINUX_CONNECTIONS_CMD, WINDOWS_CONNECTIONS_CMD};
use crate::core::{Platform, ProbeContext, Reply};
use crate::utils::ProbeError;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub protocol: String,
    pub local_address: String,
    pub local_port: String,
    pub peer_address: String,
    pub peer_port: String,
    pub state: String,
    pub pid: Option<u32>,
}

/// Split `addr:port`, `[v6]:port` or `*:*` at the last `sep`
fn split_endpoint(endpoint: &str, sep: char) -> (String, String) {
    match endpoint.rsplit_once(sep) {
        Some((addr, port)) => (
            addr.trim_start_matches('[').trim_end_matches(']').to_string(),
            port.to_string(),
        ),
        None => (endpoint.to_string(), String::new()),
    }
}

fn normalize_state(state: &str) -> String {
    match state {
        "ESTAB" => "ESTABLISHED".to_string(),
        "LISTENING" => "LISTEN".to_string(),
        "UNCONN" => String::new(),
        other => other.replace('-', "_").to_ascii_uppercase(),
    }
}

/// `pid=1234` inside an `ss` users column
fn ss_pid(process: &str) -> Option<u32> {
    let start = process.find("pid=")? + 4;
    let digits: String = process[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// `ss -tunap` rows
pub fn parse_ss(output: &str) -> Vec<Connection> {
    output
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 6 || !matches!(fields[0], "tcp" | "udp") {
                return None;
            }
            let (local_address, local_port) = split_endpoint(fields[4], ':');
            let (peer_address, peer_port) = split_endpoint(fields[5], ':');
            Some(Connection {
                protocol: fields[0].to_string(),
                local_address,
                local_port,
                peer_address,
                peer_port,
                state: normalize_state(fields[1]),
                pid: fields.get(6).and_then(|p| ss_pid(p)),
            })
        })
        .collect()
}

/// `netstat -ano` rows. UDP rows have no state column.
pub fn parse_netstat_windows(output: &str) -> Vec<Connection> {
    output
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let protocol = fields.first()?.to_ascii_lowercase();
            let (state, pid) = match (protocol.as_str(), fields.len()) {
                ("tcp", 5) => (normalize_state(fields[3]), fields[4]),
                ("udp", 4) => (String::new(), fields[3]),
                _ => return None,
            };
            let (local_address, local_port) = split_endpoint(fields[1], ':');
            let (peer_address, peer_port) = split_endpoint(fields[2], ':');
            Some(Connection {
                protocol,
                local_address,
                local_port,
                peer_address,
                peer_port,
                state,
                pid: pid.parse().ok(),
            })
        })
        .collect()
}

/// BSD `netstat -an` rows, where the port follows the last `.`
pub fn parse_netstat_bsd(output: &str) -> Vec<Connection> {
    output
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let raw_protocol = *fields.first()?;
            let protocol = if raw_protocol.starts_with("tcp") {
                "tcp"
            } else if raw_protocol.starts_with("udp") {
                "udp"
            } else {
                return None;
            };
            if fields.len() < 5 {
                return None;
            }
            let (local_address, local_port) = split_endpoint(fields[3], '.');
            let (peer_address, peer_port) = split_endpoint(fields[4], '.');
            Some(Connection {
                protocol: protocol.to_string(),
                local_address,
                local_port,
                peer_address,
                peer_port,
                state: fields.get(5).map(|s| normalize_state(s)).unwrap_or_default(),
                pid: None,
            })
        })
        .collect()
}

pub async fn list_connections(ctx: &ProbeContext) -> Result<Vec<Connection>, ProbeError> {
    match ctx.platform() {
        Some(Platform::Linux) => Ok(parse_ss(&ctx.exec(LINUX_CONNECTIONS_CMD).await?)),
        Some(Platform::Windows) => Ok(parse_netstat_windows(
            &ctx.exec(WINDOWS_CONNECTIONS_CMD).await?,
        )),
        Some(platform) if platform.is_bsd_like() => {
            Ok(parse_netstat_bsd(&ctx.exec(BSD_CONNECTIONS_CMD).await?))
        }
        _ => Err(ProbeError::Unsupported {
            probe: "network_connections",
            platform: ctx.platform_label(),
        }),
    }
}

pub async fn network_connections(ctx: ProbeContext, reply: Reply) -> Result<(), ProbeError> {
    let connections = list_connections(&ctx).await?;
    reply.send(connections);
    Ok(())
}
