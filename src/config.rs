//! Environment-driven configuration for the `sysprobe` binary and
//! [`local_runtime`](crate::platform::local_runtime).

use crate::constants::DEFAULT_WINRM_PORT;
use crate::models::{SecureString, WinRmConfig};
use crate::utils::{ProbeError, RetryConfig};

pub const ENV_WINRM_HOST: &str = "SYSPROBE_WINRM_HOST";
pub const ENV_WINRM_PORT: &str = "SYSPROBE_WINRM_PORT";
pub const ENV_WINRM_USERNAME: &str = "SYSPROBE_WINRM_USERNAME";
pub const ENV_WINRM_PASSWORD: &str = "SYSPROBE_WINRM_PASSWORD";
pub const ENV_WINRM_RETRIES: &str = "SYSPROBE_WINRM_RETRIES";

const DEFAULT_WINRM_RETRIES: u32 = 2;

#[derive(Debug, Clone)]
pub struct SysprobeConfig {
    /// Target for every probe when set; local execution otherwise
    pub remote: Option<WinRmConfig>,
    /// Retries for transient WinRM failures
    pub winrm_retries: u32,
}

impl Default for SysprobeConfig {
    fn default() -> Self {
        Self {
            remote: None,
            winrm_retries: DEFAULT_WINRM_RETRIES,
        }
    }
}

impl SysprobeConfig {
    pub fn from_env() -> Result<Self, ProbeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ProbeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let winrm_retries = match get(ENV_WINRM_RETRIES) {
            Some(raw) => raw.trim().parse().map_err(|_| {
                ProbeError::InvalidOption(format!("{} must be a number, got '{}'", ENV_WINRM_RETRIES, raw))
            })?,
            None => DEFAULT_WINRM_RETRIES,
        };

        let remote = match get(ENV_WINRM_HOST) {
            Some(host) => {
                let port = match get(ENV_WINRM_PORT) {
                    Some(raw) => raw.trim().parse().map_err(|_| {
                        ProbeError::InvalidOption(format!("{} must be a port number, got '{}'", ENV_WINRM_PORT, raw))
                    })?,
                    None => DEFAULT_WINRM_PORT,
                };
                let config = WinRmConfig::new(
                    host.trim(),
                    port,
                    get(ENV_WINRM_USERNAME).unwrap_or_default(),
                    SecureString::new(get(ENV_WINRM_PASSWORD).unwrap_or_default()),
                );
                config.credentials()?;
                Some(config)
            }
            None => None,
        };

        Ok(Self {
            remote,
            winrm_retries,
        })
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig::with_retries(self.winrm_retries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_local() {
        let config = SysprobeConfig::from_lookup(lookup(&[])).unwrap();
        assert!(config.remote.is_none());
        assert_eq!(config.winrm_retries, 2);
        assert_eq!(config.retry().max_retries, 2);
    }

    #[test]
    fn reads_remote_target() {
        let config = SysprobeConfig::from_lookup(lookup(&[
            (ENV_WINRM_HOST, "srv01"),
            (ENV_WINRM_PORT, "5986"),
            (ENV_WINRM_USERNAME, "admin"),
            (ENV_WINRM_PASSWORD, "pw"),
            (ENV_WINRM_RETRIES, "0"),
        ]))
        .unwrap();
        let remote = config.remote.unwrap();
        assert!(remote.winrm);
        assert_eq!(remote.endpoint(), "srv01:5986");
        assert_eq!(remote.password.as_str(), "pw");
        assert_eq!(config.winrm_retries, 0);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(SysprobeConfig::from_lookup(lookup(&[(ENV_WINRM_RETRIES, "many")])).is_err());
        assert!(SysprobeConfig::from_lookup(lookup(&[
            (ENV_WINRM_HOST, "srv01"),
            (ENV_WINRM_PORT, "99999"),
            (ENV_WINRM_USERNAME, "admin"),
        ]))
        .is_err());
        let err = SysprobeConfig::from_lookup(lookup(&[(ENV_WINRM_HOST, "srv01")])).unwrap_err();
        assert!(matches!(err, ProbeError::InvalidOption(_)));
    }
}
