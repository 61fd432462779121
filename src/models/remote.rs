//! Remote endpoint configuration
//!
//! A `WinRmConfig` describes one remote Windows host. It is built per call
//! and never persisted.

use super::credentials::{Credentials, SecureString, Username};
use crate::constants::DEFAULT_WINRM_PORT;
use crate::utils::CredentialError;
use serde::Deserialize;

fn default_port() -> u16 {
    DEFAULT_WINRM_PORT
}

/// Connection settings for a remote Windows host reached over WinRM
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WinRmConfig {
    /// Remote execution is only selected when this is set
    #[serde(default)]
    pub winrm: bool,
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: SecureString,
    /// Caller's platform hint. The remote wrapper ignores it.
    #[serde(default)]
    pub platform: Option<String>,
}

impl WinRmConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: SecureString,
    ) -> Self {
        Self {
            winrm: true,
            host: host.into(),
            port,
            username: username.into(),
            password,
            platform: None,
        }
    }

    /// Validated credentials for opening a session
    pub fn credentials(&self) -> Result<Credentials, CredentialError> {
        if self.host.trim().is_empty() {
            return Err(CredentialError::MissingHost);
        }
        let username = Username::new(self.username.as_str())?;
        Ok(Credentials::new(username, self.password.clone()))
    }

    /// `host:port` label used in diagnostics
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host.trim(), self.port)
    }
}
