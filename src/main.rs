//! `sysprobe [probe[=param] ...]`
//!
//! Runs the named probes (every network probe when none are named) against
//! the local host, or against `SYSPROBE_WINRM_HOST` when it is set, and
//! prints one JSON object keyed by probe name.

use futures::future::join_all;
use serde_json::{Map, Value};
use sysprobe::{logger, SystemProbes, SysprobeConfig};

const DEFAULT_PROBES: &[&str] = &[
    "network_interfaces",
    "network_interface_default",
    "network_gateway_default",
    "network_stats",
    "network_connections",
];

/// `name=param` or bare `name`
fn parse_request(arg: &str) -> (String, Option<String>) {
    match arg.split_once('=') {
        Some((name, param)) => (name.to_string(), Some(param.to_string())),
        None => (arg.to_string(), None),
    }
}

#[tokio::main]
async fn main() {
    logger::init_logger();

    let config = match SysprobeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    let mut requests: Vec<(String, Option<String>)> =
        std::env::args().skip(1).map(|a| parse_request(&a)).collect();
    if requests.is_empty() {
        requests = DEFAULT_PROBES
            .iter()
            .map(|name| (name.to_string(), None))
            .collect();
    }

    let probes = SystemProbes::local(&config);
    let options = config
        .remote
        .as_ref()
        .map(|remote| {
            serde_json::json!({
                "winrm": true,
                "host": remote.host,
                "port": remote.port,
                "username": remote.username,
                "password": remote.password.as_str(),
            })
        });

    match &config.remote {
        Some(remote) => tracing::info!(endpoint = %remote.endpoint(), "probing remote host"),
        None => tracing::info!("probing local host"),
    }

    let outcomes = join_all(requests.iter().map(|(name, param)| {
        probes.call(name, options.clone(), param.clone())
    }))
    .await;

    let mut report = Map::new();
    for ((name, _), outcome) in requests.into_iter().zip(outcomes) {
        report.insert(name, outcome.to_value());
    }

    match serde_json::to_string_pretty(&Value::Object(report)) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            tracing::error!("Failed to render report: {}", e);
            std::process::exit(1);
        }
    }
}
