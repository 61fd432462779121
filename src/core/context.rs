//! Probe runtime and per-call context
//!
//! A [`ProbeRuntime`] holds the long-lived collaborators (local shell, WinRM
//! transport, native interface source, default-interface cache). Each call
//! derives a [`ProbeContext`] from its options; the context routes command
//! execution to the local shell or to a freshly opened remote session.

use super::options::ProbeOptions;
use super::platform::Platform;
use super::session::{CommandRunner, HostInterface, InterfaceSource, RemoteSession, SessionFactory};
use crate::utils::ProbeError;
use std::sync::{Arc, OnceLock, RwLock};

/// Last successfully resolved default interface name
///
/// Starts empty, is overwritten only with non-empty names and is never
/// cleared. Clones share the same slot. Writes are last-write-wins.
#[derive(Debug, Clone, Default)]
pub struct InterfaceCache(Arc<RwLock<String>>);

impl InterfaceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache used by [`ProbeRuntime`]s that are not given one
    pub fn global() -> Self {
        static GLOBAL: OnceLock<InterfaceCache> = OnceLock::new();
        GLOBAL.get_or_init(InterfaceCache::default).clone()
    }

    pub fn get(&self) -> String {
        match self.0.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Store `name` unless it is empty. Returns whether the cache changed.
    pub fn store(&self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        let mut guard = match self.0.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *guard == name {
            return false;
        }
        *guard = name.to_string();
        true
    }
}

/// Long-lived collaborators shared by every probe call
pub struct ProbeRuntime {
    shell: Arc<dyn CommandRunner>,
    transport: Arc<dyn SessionFactory>,
    native: Arc<dyn InterfaceSource>,
    cache: InterfaceCache,
}

impl ProbeRuntime {
    pub fn new(
        shell: Arc<dyn CommandRunner>,
        transport: Arc<dyn SessionFactory>,
        native: Arc<dyn InterfaceSource>,
        cache: InterfaceCache,
    ) -> Self {
        Self {
            shell,
            transport,
            native,
            cache,
        }
    }

    pub fn cache(&self) -> &InterfaceCache {
        &self.cache
    }

    /// Build the context for one call, opening a WinRM session when the
    /// options select remote execution
    pub async fn context(&self, options: ProbeOptions) -> Result<ProbeContext, ProbeError> {
        let platform = options.platform();
        let session = match (&options.remote, options.is_remote()) {
            (Some(config), true) => {
                tracing::debug!(endpoint = %config.endpoint(), "opening remote session");
                Some(self.transport.open(config).await?)
            }
            _ => None,
        };

        Ok(ProbeContext {
            options,
            platform,
            shell: self.shell.clone(),
            session,
            native: self.native.clone(),
            cache: self.cache.clone(),
        })
    }
}

/// Everything a probe needs for one call
#[derive(Clone)]
pub struct ProbeContext {
    options: ProbeOptions,
    platform: Option<Platform>,
    shell: Arc<dyn CommandRunner>,
    session: Option<Arc<dyn RemoteSession>>,
    native: Arc<dyn InterfaceSource>,
    cache: InterfaceCache,
}

impl ProbeContext {
    pub fn options(&self) -> &ProbeOptions {
        &self.options
    }

    pub fn platform(&self) -> Option<Platform> {
        self.platform
    }

    pub fn is(&self, platform: Platform) -> bool {
        self.platform == Some(platform)
    }

    /// Commands run on a remote WinRM host
    pub fn is_remote(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Arc<dyn RemoteSession>> {
        self.session.as_ref()
    }

    pub fn cache(&self) -> &InterfaceCache {
        &self.cache
    }

    /// Platform label for diagnostics and `Unsupported` errors
    pub fn platform_label(&self) -> String {
        self.platform
            .map(|p| p.to_string())
            .unwrap_or_else(|| std::env::consts::OS.to_string())
    }

    /// Run a shell one-liner on the target host
    pub async fn exec(&self, command: &str) -> Result<String, ProbeError> {
        match &self.session {
            Some(session) => {
                tracing::debug!(server = session.server_name(), command, "remote exec");
                session.run(command).await
            }
            None => {
                tracing::debug!(command, "local exec");
                self.shell.run(command).await
            }
        }
    }

    /// Run a PowerShell script on the target host
    pub async fn powershell(&self, script: &str) -> Result<String, ProbeError> {
        match &self.session {
            Some(session) => session.run_powershell(script).await,
            None => self.shell.run_powershell(script).await,
        }
    }

    /// OS-native interface descriptors; `None` when the target is remote
    pub fn native_interfaces(&self) -> Option<Result<Vec<HostInterface>, ProbeError>> {
        if self.is_remote() {
            None
        } else {
            Some(self.native.interfaces())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mock_session::{MockTransport, ScriptedShell, StaticInterfaces};
    use crate::models::{SecureString, WinRmConfig};

    #[test]
    fn cache_ignores_empty_and_is_shared_between_clones() {
        let cache = InterfaceCache::new();
        let other = cache.clone();
        assert!(!cache.store(""));
        assert_eq!(other.get(), "");
        assert!(cache.store("eth0"));
        assert_eq!(other.get(), "eth0");
        assert!(!other.store("eth0"));
        assert!(!other.store(""));
        assert_eq!(cache.get(), "eth0");
    }

    #[test]
    fn global_cache_is_one_slot() {
        let a = InterfaceCache::global();
        let b = InterfaceCache::global();
        assert!(Arc::ptr_eq(&a.0, &b.0));
        assert!(!Arc::ptr_eq(&a.0, &InterfaceCache::new().0));
    }

    fn runtime(transport: MockTransport) -> ProbeRuntime {
        ProbeRuntime::new(
            Arc::new(ScriptedShell::new().on("hostname", "local-box\n")),
            Arc::new(transport),
            Arc::new(StaticInterfaces::default()),
            InterfaceCache::new(),
        )
    }

    #[tokio::test]
    async fn local_context_uses_shell() {
        let rt = runtime(MockTransport::unreachable());
        let ctx = rt.context(ProbeOptions::local()).await.unwrap();
        assert!(!ctx.is_remote());
        assert!(ctx.native_interfaces().is_some());
        assert_eq!(ctx.exec("hostname").await.unwrap(), "local-box\n");
    }

    #[tokio::test]
    async fn remote_context_uses_session() {
        let transport = MockTransport::with_script("hostname", "SRV01\r\n");
        let rt = runtime(transport);
        let mut options = ProbeOptions::with_platform(Platform::Windows);
        options.remote = Some(WinRmConfig::new("srv01", 5985, "admin", SecureString::new("pw")));

        let ctx = rt.context(options).await.unwrap();
        assert!(ctx.is_remote());
        assert!(ctx.native_interfaces().is_none());
        assert_eq!(ctx.exec("hostname").await.unwrap(), "SRV01\r\n");
    }

    #[tokio::test]
    async fn failing_transport_fails_context() {
        let rt = runtime(MockTransport::unreachable());
        let mut options = ProbeOptions::with_platform(Platform::Windows);
        options.remote = Some(WinRmConfig::new("srv01", 5985, "admin", SecureString::new("pw")));

        assert!(rt.context(options).await.is_err());
    }
}
