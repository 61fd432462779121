//! WinRM remote sessions
//!
//! Every script runs inside its own explicit `New-PSSession`, driven by a
//! local PowerShell process. Credentials and the script travel on stdin as a
//! JSON payload, so the password never appears in process arguments. The
//! script is base64-encoded to survive quoting.

use super::shell::powershell_program;
use crate::constants::MAX_REMOTE_ERROR_LEN;
use crate::core::{CommandRunner, RemoteSession, SessionFactory};
use crate::models::{SecureString, WinRmConfig};
use crate::utils::{is_transient_session_error, retry_with_backoff, ProbeError, RetryConfig, SessionError};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;
use std::process::Command;
use std::sync::Arc;

#[cfg(windows)]
use std::os::windows::process::CommandExt;

const PS_REMOTING_WRAPPER: &str = r#"$ErrorActionPreference = 'Stop'
$session = $null
try {
    $raw = [Console]::In.ReadToEnd()
    if ([string]::IsNullOrWhiteSpace($raw)) { throw 'No input provided' }
    $payload = $raw | ConvertFrom-Json

    $server = [string]$payload.server
    $port = [int]$payload.port
    $username = [string]$payload.username
    $pwPlain = [string]$payload.password
    $scriptBytes = [System.Convert]::FromBase64String([string]$payload.script_b64)
    $scriptText = [System.Text.Encoding]::UTF8.GetString($scriptBytes)

    $pwSecure = New-Object System.Security.SecureString
    $pwPlain.ToCharArray() | ForEach-Object { $pwSecure.AppendChar($_) }
    $cred = New-Object System.Management.Automation.PSCredential($username, $pwSecure)

    # Explicit session so Remove-PSSession frees wsmprovhost.exe on the target right away
    $session = New-PSSession -ComputerName $server -Port $port -Credential $cred -ErrorAction Stop

    Invoke-Command -Session $session -ErrorAction Stop -ScriptBlock {
        param($text)
        $sb = [ScriptBlock]::Create($text)
        & $sb
    } -ArgumentList $scriptText
} catch {
    Write-Error $_.Exception.Message
    exit 1
} finally {
    if ($session) {
        Remove-PSSession -Session $session -ErrorAction SilentlyContinue
    }
}"#;

#[derive(Serialize)]
struct PsRemotingPayload<'a> {
    server: &'a str,
    port: u16,
    username: &'a str,
    password: &'a str,
    script_b64: String,
}

/// Session on a remote Windows host reached over PowerShell Remoting
///
/// Requires WinRM on the target (`Enable-PSRemoting`) and network access
/// to its listener port.
pub struct WindowsRemoteSession {
    server_name: String,
    port: u16,
    username: String,
    password: SecureString,
    retry: RetryConfig,
}

impl WindowsRemoteSession {
    /// Validate `config` and prepare a session. No connection is made until
    /// the first script runs.
    pub fn connect(config: &WinRmConfig, retry: RetryConfig) -> Result<Self, ProbeError> {
        let credentials = config.credentials()?;
        Ok(Self {
            server_name: config.host.trim().to_string(),
            port: config.port,
            username: credentials.username().as_str().to_string(),
            password: credentials.password().clone(),
            retry,
        })
    }

    fn payload_json(&self, script: &str) -> Result<String, SessionError> {
        serde_json::to_string(&PsRemotingPayload {
            server: &self.server_name,
            port: self.port,
            username: &self.username,
            password: self.password.as_str(),
            script_b64: general_purpose::STANDARD.encode(script.as_bytes()),
        })
        .map_err(|e| SessionError::WinRm(format!("Failed to serialize PowerShell payload: {}", e)))
    }

    async fn execute_once(&self, script: &str) -> Result<String, SessionError> {
        let payload_json = self.payload_json(script)?;

        let output = tokio::task::spawn_blocking(move || {
            use std::io::Write;

            let mut cmd = Command::new(powershell_program());
            cmd.arg("-NoProfile")
                .arg("-NonInteractive")
                .arg("-Command")
                .arg(PS_REMOTING_WRAPPER)
                .stdin(std::process::Stdio::piped())
                .stdout(std::process::Stdio::piped())
                .stderr(std::process::Stdio::piped());

            #[cfg(windows)]
            cmd.creation_flags(crate::constants::CREATE_NO_WINDOW);

            let mut child = cmd.spawn().map_err(|e| {
                std::io::Error::other(format!("Failed to spawn {}: {}", powershell_program(), e))
            })?;

            {
                let mut stdin = child
                    .stdin
                    .take()
                    .ok_or_else(|| std::io::Error::other("Failed to open stdin"))?;
                stdin.write_all(payload_json.as_bytes())?;
            }

            child.wait_with_output()
        })
        .await
        .map_err(|e| SessionError::WinRm(format!("Task execution failed: {}", e)))?
        .map_err(|e| SessionError::WinRm(format!("PowerShell execution failed: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let raw_error = if !stderr.trim().is_empty() {
                stderr.to_string()
            } else if !stdout.trim().is_empty() {
                stdout.to_string()
            } else {
                "Unknown error".to_string()
            };

            let redacted = self.redact(&raw_error);
            tracing::error!(
                server = %self.server_name,
                port = self.port,
                "PowerShell remoting failed: {}",
                redacted
            );
            return Err(classify_error(&simplify_error_message(&redacted)));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Remove the password from text that may echo it
    fn redact(&self, text: &str) -> String {
        if self.password.is_empty() {
            text.to_string()
        } else {
            text.replace(self.password.as_str(), "<redacted>")
        }
    }
}

/// Turn raw PowerShell error text into a short, actionable message
pub(crate) fn simplify_error_message(raw_error: &str) -> String {
    let lower = raw_error.to_lowercase();

    if lower.contains("trustedhosts") || lower.contains("authentication scheme") {
        return "WinRM authentication failed. The target server must be in TrustedHosts.\n\
             Run as admin: Set-Item WSMan:\\localhost\\Client\\TrustedHosts -Value '*' -Force"
            .to_string();
    }

    if lower.contains("access is denied") || lower.contains("access denied") {
        return "Access denied. Check username and password are correct.".to_string();
    }

    if lower.contains("the user name or password is incorrect") {
        return "Invalid credentials. Check username and password.".to_string();
    }

    if lower.contains("cannot find the computer") || lower.contains("cannot be resolved") {
        return "Server not found. Check the hostname is correct and reachable.".to_string();
    }

    if lower.contains("winrm cannot complete the operation") {
        return "WinRM service not responding. Ensure WinRM is enabled on the target server."
            .to_string();
    }

    if lower.contains("connection refused") || lower.contains("actively refused") {
        return "Connection refused. WinRM may not be enabled on the target server.".to_string();
    }

    if lower.contains("network path was not found") {
        return "Network path not found. Check network connectivity to server.".to_string();
    }

    let snippet = raw_error.trim();
    if snippet.is_empty() {
        return "Remote command failed".to_string();
    }

    match snippet.char_indices().nth(MAX_REMOTE_ERROR_LEN) {
        Some((cut, _)) => format!("{}...", &snippet[..cut]),
        None => snippet.to_string(),
    }
}

/// Map a simplified message onto the session error it describes
fn classify_error(message: &str) -> SessionError {
    let lower = message.to_lowercase();
    if lower.starts_with("access denied")
        || lower.starts_with("invalid credentials")
        || lower.starts_with("winrm authentication failed")
    {
        SessionError::Authentication
    } else if lower.starts_with("server not found")
        || lower.starts_with("connection refused")
        || lower.starts_with("network path not found")
        || lower.starts_with("winrm service not responding")
    {
        SessionError::Connection(message.to_string())
    } else {
        SessionError::CommandFailed(message.to_string())
    }
}

#[async_trait]
impl CommandRunner for WindowsRemoteSession {
    async fn run(&self, command: &str) -> Result<String, ProbeError> {
        Ok(self.execute_powershell(command).await?)
    }

    async fn run_powershell(&self, script: &str) -> Result<String, ProbeError> {
        Ok(self.execute_powershell(script).await?)
    }
}

#[async_trait]
impl RemoteSession for WindowsRemoteSession {
    fn server_name(&self) -> &str {
        &self.server_name
    }

    async fn execute_powershell(&self, script: &str) -> Result<String, SessionError> {
        retry_with_backoff(
            self.retry.clone(),
            || self.execute_once(script),
            is_transient_session_error,
        )
        .await
    }
}

/// Opens [`WindowsRemoteSession`]s
#[derive(Debug, Clone, Default)]
pub struct WinRmTransport {
    retry: RetryConfig,
}

impl WinRmTransport {
    pub fn new(retry: RetryConfig) -> Self {
        Self { retry }
    }
}

#[async_trait]
impl SessionFactory for WinRmTransport {
    async fn open(&self, config: &WinRmConfig) -> Result<Arc<dyn RemoteSession>, ProbeError> {
        let session = WindowsRemoteSession::connect(config, self.retry.clone())?;
        Ok(Arc::new(session))
    }
}
