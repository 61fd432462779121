//! Installed services and whether they run

use super::processes::{filter_terms, like_condition, matches_terms};
use super::run_ps_json;
use crate::constants::{DARWIN_SERVICES_CMD, LINUX_SERVICES_CMD};
use crate::core::{Platform, ProbeContext, Reply};
use crate::normalize::{json_str, normalize_array};
use crate::utils::ProbeError;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceEntry {
    pub name: String,
    pub running: bool,
    /// `Automatic`, `Manual`, `Disabled` on Windows; empty elsewhere
    pub startmode: String,
}

fn windows_services_script(terms: &[String]) -> String {
    format!(
        "@(Get-Service -ErrorAction SilentlyContinue | Where-Object {{ {} }} | \
         Select-Object Name, @{{n='Status';e={{[string]$_.Status}}}}, @{{n='StartType';e={{[string]$_.StartType}}}}) | \
         ConvertTo-Json -Compress",
        like_condition("Name", terms)
    )
}

pub fn parse_windows_services(value: Value) -> Vec<ServiceEntry> {
    normalize_array(value)
        .iter()
        .map(|item| ServiceEntry {
            name: json_str(item, "Name"),
            running: json_str(item, "Status").eq_ignore_ascii_case("running"),
            startmode: json_str(item, "StartType"),
        })
        .collect()
}

/// `systemctl list-units --plain` rows: unit, load, active, sub, description
pub fn parse_systemctl(output: &str, terms: &[String]) -> Vec<ServiceEntry> {
    output
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                return None;
            }
            let name = fields[0].trim_end_matches(".service");
            matches_terms(name, terms).then(|| ServiceEntry {
                name: name.to_string(),
                running: fields[3] == "running",
                startmode: String::new(),
            })
        })
        .collect()
}

/// `launchctl list` rows: PID (or `-`), status, label
pub fn parse_launchctl(output: &str, terms: &[String]) -> Vec<ServiceEntry> {
    output
        .lines()
        .skip_while(|line| line.starts_with("PID"))
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let [pid, _status, label, ..] = fields.as_slice() else {
                return None;
            };
            matches_terms(label, terms).then(|| ServiceEntry {
                name: label.to_string(),
                running: pid.parse::<u32>().is_ok(),
                startmode: String::new(),
            })
        })
        .collect()
}

pub async fn list_services(
    ctx: &ProbeContext,
    filter: Option<&str>,
) -> Result<Vec<ServiceEntry>, ProbeError> {
    let terms = filter_terms(filter);
    match ctx.platform() {
        Some(Platform::Windows) => {
            let value: Value =
                run_ps_json(ctx, &windows_services_script(&terms), "services").await?;
            Ok(parse_windows_services(value))
        }
        Some(Platform::Linux) => Ok(parse_systemctl(&ctx.exec(LINUX_SERVICES_CMD).await?, &terms)),
        Some(Platform::Darwin) => Ok(parse_launchctl(
            &ctx.exec(DARWIN_SERVICES_CMD).await?,
            &terms,
        )),
        _ => Err(ProbeError::Unsupported {
            probe: "services",
            platform: ctx.platform_label(),
        }),
    }
}

pub async fn services(
    ctx: ProbeContext,
    filter: Option<String>,
    reply: Reply,
) -> Result<(), ProbeError> {
    let entries = list_services(&ctx, filter.as_deref()).await?;
    reply.send(entries);
    Ok(())
}
