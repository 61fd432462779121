//! Text helpers for command output and user-supplied names.
//!
//! Probes parse the output of `netstat`, `ip`, `route`, `ss` and PowerShell.
//! The helpers here keep that parsing uniform, and validate anything a caller
//! hands us before it is embedded in a command line.

use crate::constants::MAX_IFACE_NAME_LEN;
use serde_json::Value;

/// Collapse every run of whitespace to a single space and trim the ends.
pub fn collapse_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The text after the first `:`, trimmed. Lines without a colon are returned trimmed.
pub fn after_colon(line: &str) -> String {
    match line.split_once(':') {
        Some((_, rest)) => rest.trim().to_string(),
        None => line.trim().to_string(),
    }
}

/// First line of command output, trimmed. Empty when there is no output.
pub fn first_line(output: &str) -> &str {
    output.lines().next().unwrap_or("").trim()
}

/// Validate a network interface name before it reaches a shell or PowerShell.
///
/// Allows letters, digits, and `- _ . : @` plus spaces (Windows aliases such as
/// `Ethernet 2`). Returns the trimmed name.
pub fn normalize_iface_name(raw: &str) -> Result<String, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("Interface name cannot be empty".to_string());
    }

    if trimmed.len() > MAX_IFACE_NAME_LEN {
        return Err(format!(
            "Interface name '{}' exceeds {} characters",
            trimmed, MAX_IFACE_NAME_LEN
        ));
    }

    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '@' | ' '))
    {
        return Err(format!(
            "Interface name '{}' contains invalid characters (allowed: A-Z, 0-9, '-', '_', '.', ':', '@', space)",
            trimmed
        ));
    }

    Ok(trimmed.to_string())
}

/// Escape text for a single-quoted PowerShell `-like` pattern.
///
/// Wildcards (`* ? [ ]`) become literal, single quotes are doubled, and the
/// characters that could end the surrounding script block get a backtick.
/// SECURITY: every caller-supplied filter goes through here before it is
/// embedded in a `Where-Object` clause.
pub fn escape_powershell_like(raw: &str) -> String {
    raw.replace('`', "``")
        .replace('\'', "''")
        .replace('[', "`[")
        .replace(']', "`]")
        .replace('*', "`*")
        .replace('?', "`?")
        .replace('{', "`{")
        .replace('}', "`}")
        .replace('$', "`$")
        .replace('(', "`(")
        .replace(')', "`)")
        .replace('|', "`|")
}

/// `ConvertTo-Json` emits a bare object for single-element results. Always hand back a list.
pub fn normalize_array(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Read a JSON field as a string, accepting numbers too.
pub fn json_str(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Read a JSON field as an unsigned number, accepting numeric strings too.
pub fn json_u64(value: &Value, key: &str) -> u64 {
    match value.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
