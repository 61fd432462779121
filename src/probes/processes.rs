//! Running processes, optionally filtered by name

use super::{blocking, run_ps_json};
use crate::core::{ProbeContext, Reply};
use crate::normalize::{escape_powershell_like, json_str, json_u64, normalize_array};
use crate::utils::ProbeError;
use serde::Serialize;
use serde_json::Value;
use sysinfo::System;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
    /// Percent for local hosts, CPU seconds for remote Windows hosts
    pub cpu: f64,
    /// Resident set size in bytes
    pub mem_rss: u64,
}

/// Comma-separated name filter split into lowercase terms
///
/// An empty filter or `*` matches everything.
pub fn filter_terms(filter: Option<&str>) -> Vec<String> {
    filter
        .unwrap_or("")
        .split(',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty() && t != "*")
        .collect()
}

pub fn matches_terms(name: &str, terms: &[String]) -> bool {
    if terms.is_empty() {
        return true;
    }
    let name = name.to_lowercase();
    terms.iter().any(|t| name.contains(t.as_str()))
}

/// PowerShell condition testing `$_.<property>` against every term
pub fn like_condition(property: &str, terms: &[String]) -> String {
    if terms.is_empty() {
        return "$true".to_string();
    }
    terms
        .iter()
        .map(|t| format!("$_.{} -like '*{}*'", property, escape_powershell_like(t)))
        .collect::<Vec<_>>()
        .join(" -or ")
}

fn remote_processes_script(terms: &[String]) -> String {
    format!(
        "@(Get-Process -ErrorAction SilentlyContinue | Where-Object {{ {} }} | \
         Select-Object Id, ProcessName, CPU, WorkingSet64) | ConvertTo-Json -Compress",
        like_condition("ProcessName", terms)
    )
}

fn local_processes(terms: Vec<String>) -> Vec<ProcessEntry> {
    let mut sys = System::new();
    sys.refresh_processes();
    let mut entries: Vec<ProcessEntry> = sys
        .processes()
        .values()
        .filter(|p| matches_terms(p.name(), &terms))
        .map(|p| ProcessEntry {
            pid: p.pid().as_u32(),
            name: p.name().to_string(),
            cpu: f64::from(p.cpu_usage()),
            mem_rss: p.memory(),
        })
        .collect();
    entries.sort_by_key(|e| e.pid);
    entries
}

pub fn parse_remote_processes(value: Value) -> Vec<ProcessEntry> {
    normalize_array(value)
        .iter()
        .map(|item| ProcessEntry {
            pid: u32::try_from(json_u64(item, "Id")).unwrap_or(0),
            name: json_str(item, "ProcessName"),
            cpu: item.get("CPU").and_then(Value::as_f64).unwrap_or(0.0),
            mem_rss: json_u64(item, "WorkingSet64"),
        })
        .collect()
}

pub async fn processes(
    ctx: ProbeContext,
    filter: Option<String>,
    reply: Reply,
) -> Result<(), ProbeError> {
    let terms = filter_terms(filter.as_deref());
    let entries = if ctx.is_remote() {
        let value: Value = run_ps_json(&ctx, &remote_processes_script(&terms), "processes").await?;
        parse_remote_processes(value)
    } else {
        blocking(move || local_processes(terms)).await?
    };
    reply.send(entries);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_terms_split_and_lowercase() {
        assert_eq!(filter_terms(Some("Nginx, sshd ,")), vec!["nginx", "sshd"]);
        assert!(filter_terms(Some("*")).is_empty());
        assert!(filter_terms(None).is_empty());
    }

    #[test]
    fn name_matching_is_case_insensitive_substring() {
        let terms = filter_terms(Some("ssh"));
        assert!(matches_terms("sshd", &terms));
        assert!(matches_terms("OpenSSH", &terms));
        assert!(!matches_terms("nginx", &terms));
        assert!(matches_terms("anything", &[]));
    }

    #[test]
    fn remote_script_escapes_wildcards_and_quotes() {
        let script = remote_processes_script(&filter_terms(Some("o'brien*")));
        assert!(script.contains("$_.ProcessName -like '*o''brien`**'"));
        assert!(remote_processes_script(&[]).contains("Where-Object { $true }"));
    }

    #[test]
    fn parses_remote_processes() {
        let rows = parse_remote_processes(json!({"Id": 4, "ProcessName": "System", "CPU": 12.5, "WorkingSet64": 1024}));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pid, 4);
        assert_eq!(rows[0].mem_rss, 1024);
        assert!(parse_remote_processes(json!([])).is_empty());
    }

    #[test]
    fn local_listing_includes_this_process() {
        let me = std::process::id();
        let rows = local_processes(Vec::new());
        assert!(rows.iter().any(|p| p.pid == me));
    }
}
