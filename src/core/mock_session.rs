//! Scripted collaborators for testing without real hosts
//!
//! Provides a command runner that answers from a table of canned outputs, a
//! mock WinRM session/transport built on it, and a fixed interface source.

use super::context::{InterfaceCache, ProbeRuntime};
use super::session::{
    CommandRunner, HostInterface, InterfaceSource, RemoteSession, SessionFactory,
};
use crate::models::WinRmConfig;
use crate::utils::{ProbeError, SessionError};
use async_trait::async_trait;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

/// Answers commands whose text contains a registered pattern
///
/// Later registrations win, so [`ScriptedShell::set`] can change an answer
/// between calls.
#[derive(Default)]
pub struct ScriptedShell {
    entries: Mutex<Vec<(String, Result<String, String>)>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, pattern: &str, output: &str) -> Self {
        self.set(pattern, output);
        self
    }

    pub fn failing(self, pattern: &str, message: &str) -> Self {
        self.push(pattern, Err(message.to_string()));
        self
    }

    pub fn set(&self, pattern: &str, output: &str) {
        self.push(pattern, Ok(output.to_string()));
    }

    fn push(&self, pattern: &str, result: Result<String, String>) {
        self.entries
            .lock()
            .unwrap()
            .push((pattern.to_string(), result));
    }

    /// Every command seen so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, command: &str) -> Result<String, String> {
        self.calls.lock().unwrap().push(command.to_string());
        self.entries
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(pattern, _)| command.contains(pattern.as_str()))
            .map(|(_, result)| result.clone())
            .unwrap_or_else(|| Err(format!("no scripted output for `{}`", command)))
    }
}

#[async_trait]
impl CommandRunner for ScriptedShell {
    async fn run(&self, command: &str) -> Result<String, ProbeError> {
        self.answer(command).map_err(ProbeError::Exec)
    }

    async fn run_powershell(&self, script: &str) -> Result<String, ProbeError> {
        self.answer(script).map_err(ProbeError::Exec)
    }
}

/// Mock WinRM session answering from a [`ScriptedShell`]
pub struct MockRemoteSession {
    server_name: String,
    shell: ScriptedShell,
}

impl MockRemoteSession {
    pub fn new(server_name: &str, shell: ScriptedShell) -> Self {
        Self {
            server_name: server_name.to_string(),
            shell,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.shell.calls()
    }
}

#[async_trait]
impl CommandRunner for MockRemoteSession {
    async fn run(&self, command: &str) -> Result<String, ProbeError> {
        Ok(self.execute_powershell(command).await?)
    }

    async fn run_powershell(&self, script: &str) -> Result<String, ProbeError> {
        Ok(self.execute_powershell(script).await?)
    }
}

#[async_trait]
impl RemoteSession for MockRemoteSession {
    fn server_name(&self) -> &str {
        &self.server_name
    }

    async fn execute_powershell(&self, script: &str) -> Result<String, SessionError> {
        self.shell
            .answer(script)
            .map_err(SessionError::CommandFailed)
    }
}

/// Transport handing out one shared mock session, or failing to connect
pub struct MockTransport {
    session: Option<Arc<MockRemoteSession>>,
    opened: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn with_session(session: MockRemoteSession) -> Self {
        Self {
            session: Some(Arc::new(session)),
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn with_script(pattern: &str, output: &str) -> Self {
        Self::with_session(MockRemoteSession::new(
            "SRV01",
            ScriptedShell::new().on(pattern, output),
        ))
    }

    pub fn unreachable() -> Self {
        Self {
            session: None,
            opened: Mutex::new(Vec::new()),
        }
    }

    /// Endpoints passed to `open`, in order
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn session(&self) -> Option<Arc<MockRemoteSession>> {
        self.session.clone()
    }
}

#[async_trait]
impl SessionFactory for MockTransport {
    async fn open(&self, config: &WinRmConfig) -> Result<Arc<dyn RemoteSession>, ProbeError> {
        self.opened.lock().unwrap().push(config.endpoint());
        match &self.session {
            Some(session) => Ok(session.clone() as Arc<dyn RemoteSession>),
            None => Err(SessionError::Connection("Connection timeout".to_string()).into()),
        }
    }
}

/// Fixed set of native interface descriptors
#[derive(Default)]
pub struct StaticInterfaces {
    interfaces: Vec<HostInterface>,
    fail: bool,
}

impl StaticInterfaces {
    pub fn new(interfaces: Vec<HostInterface>) -> Self {
        Self {
            interfaces,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            interfaces: Vec::new(),
            fail: true,
        }
    }
}

impl InterfaceSource for StaticInterfaces {
    fn interfaces(&self) -> Result<Vec<HostInterface>, ProbeError> {
        if self.fail {
            return Err(ProbeError::Exec("interface enumeration failed".to_string()));
        }
        Ok(self.interfaces.clone())
    }
}

/// Runtime with no native interfaces and a fresh cache
pub fn runtime_with(shell: ScriptedShell, transport: MockTransport) -> Arc<ProbeRuntime> {
    runtime_parts(
        Arc::new(shell),
        Arc::new(transport),
        StaticInterfaces::default(),
        InterfaceCache::new(),
    )
}

/// Runtime from shared parts, so tests can inspect them afterwards
pub fn runtime_parts(
    shell: Arc<ScriptedShell>,
    transport: Arc<MockTransport>,
    native: StaticInterfaces,
    cache: InterfaceCache,
) -> Arc<ProbeRuntime> {
    Arc::new(ProbeRuntime::new(shell, transport, Arc::new(native), cache))
}

/// Shorthand for building a [`HostInterface`]
pub fn host_iface(name: &str, ip: &str, internal: bool, scope_id: Option<u32>) -> HostInterface {
    HostInterface {
        name: name.to_string(),
        ip: ip.parse::<IpAddr>().unwrap(),
        netmask: None,
        internal,
        scope_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn later_entries_override_earlier_ones() {
        let shell = ScriptedShell::new().on("ip route", "default via 10.0.0.1 dev eth0");
        assert!(shell.run("ip route | grep default").await.unwrap().contains("eth0"));
        shell.set("ip route", "");
        assert_eq!(shell.run("ip route | grep default").await.unwrap(), "");
        assert_eq!(shell.calls().len(), 2);
    }

    #[tokio::test]
    async fn unknown_commands_fail() {
        let shell = ScriptedShell::new();
        assert!(shell.run("uname -a").await.is_err());
    }

    #[tokio::test]
    async fn unreachable_transport_refuses_sessions() {
        let transport = MockTransport::unreachable();
        let cfg = WinRmConfig::new("srv01", 5985, "admin", Default::default());
        assert!(transport.open(&cfg).await.is_err());
        assert_eq!(transport.opened(), vec!["srv01:5985".to_string()]);
    }

    #[tokio::test]
    async fn mock_session_reports_command_failures_as_session_errors() {
        let session = MockRemoteSession::new("SRV01", ScriptedShell::new().failing("Get-Service", "Access is denied"));
        let err = session.execute_powershell("Get-Service").await.unwrap_err();
        assert!(matches!(err, SessionError::CommandFailed(_)));
        assert_eq!(session.server_name(), "SRV01");
    }
}
