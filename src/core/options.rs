//! Per-call probe options

use super::platform::Platform;
use crate::models::WinRmConfig;
use crate::utils::ProbeError;
use serde::Deserialize;

/// Options handed to a probe
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProbeOptions {
    /// Platform override (`win32`, `linux`, `darwin`, ...)
    #[serde(default)]
    pub platform: Option<String>,
    /// Remote endpoint, when the call targets a WinRM host
    #[serde(default)]
    pub remote: Option<WinRmConfig>,
}

impl ProbeOptions {
    pub fn local() -> Self {
        Self::default()
    }

    pub fn with_platform(platform: Platform) -> Self {
        Self {
            platform: Some(platform.as_str().to_string()),
            remote: None,
        }
    }

    /// Platform for this call
    pub fn platform(&self) -> Option<Platform> {
        Platform::resolve(self.platform.as_deref())
    }

    /// True when the `winrm` flag is set and the call resolves to Windows
    pub fn is_remote(&self) -> bool {
        self.remote.as_ref().is_some_and(|r| r.winrm)
            && self.platform() == Some(Platform::Windows)
    }
}

/// Parse a flat options document (`{"winrm": true, "host": ..., "platform": ...}`)
///
/// `null` means "no remote config".
pub fn remote_config_from_json(
    value: Option<serde_json::Value>,
) -> Result<Option<WinRmConfig>, ProbeError> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => serde_json::from_value(v)
            .map(Some)
            .map_err(|e| ProbeError::InvalidOption(e.to_string())),
    }
}
