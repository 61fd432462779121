//! Exported probe surface
//!
//! Every registered probe is composed once as `safe(remote(adapt(probe)))`
//! and exposed both as a typed method and through the dynamic [`SystemProbes::call`].

use super::adapter::adapt;
use super::context::ProbeRuntime;
use super::options::remote_config_from_json;
use super::outcome::ProbeOutcome;
use super::registry::ProbeRegistry;
use super::remote::remote;
use super::safety::{safe, SafeFuture};
use crate::models::WinRmConfig;
use crate::utils::ProbeError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

type Exported = Arc<dyn Fn(Option<WinRmConfig>, Option<String>) -> SafeFuture + Send + Sync>;

/// All probes, wrapped and ready to call
#[derive(Clone)]
pub struct SystemProbes {
    runtime: Arc<ProbeRuntime>,
    exported: Arc<BTreeMap<&'static str, Exported>>,
}

impl SystemProbes {
    /// Export every built-in probe
    pub fn new(runtime: Arc<ProbeRuntime>) -> Self {
        Self::with_registry(runtime, &ProbeRegistry::builtin())
    }

    pub fn with_registry(runtime: Arc<ProbeRuntime>, registry: &ProbeRegistry) -> Self {
        let exported = registry
            .iter()
            .map(|probe| {
                let name = probe.name();
                let redirected = remote(adapt(probe.clone(), runtime.clone()));
                let wrapped = safe(name, move |config: Option<WinRmConfig>, param: Option<String>| {
                    let call = redirected(config, param);
                    async move { Ok::<_, ProbeError>(call.await) }
                });
                (name, Arc::new(wrapped) as Exported)
            })
            .collect();

        Self {
            runtime,
            exported: Arc::new(exported),
        }
    }

    pub fn runtime(&self) -> &Arc<ProbeRuntime> {
        &self.runtime
    }

    /// Names of every exported probe
    pub fn names(&self) -> Vec<&'static str> {
        self.exported.keys().copied().collect()
    }

    async fn invoke(
        &self,
        name: &str,
        config: Option<WinRmConfig>,
        param: Option<String>,
    ) -> ProbeOutcome {
        match self.exported.get(name) {
            Some(exported) => exported(config, param).await,
            None => ProbeOutcome::Failed(ProbeError::UnknownProbe(name.to_string()).to_string()),
        }
    }

    /// Call a probe by name with a JSON options document
    ///
    /// A malformed document or an unknown name resolves to
    /// [`ProbeOutcome::Failed`]; this never errors.
    pub async fn call(
        &self,
        name: &str,
        options: Option<Value>,
        param: Option<String>,
    ) -> ProbeOutcome {
        let exported = self.exported.clone();
        let name = name.to_string();
        let dispatch = safe("call", move |options: Option<Value>, param: Option<String>| {
            let exported = exported.clone();
            let name = name.clone();
            async move {
                let config = remote_config_from_json(options)?;
                let probe = exported
                    .get(name.as_str())
                    .cloned()
                    .ok_or(ProbeError::UnknownProbe(name))?;
                Ok(probe(config, param).await)
            }
        });
        dispatch(options, param).await
    }

    pub async fn network_interfaces(&self, config: Option<WinRmConfig>) -> ProbeOutcome {
        self.invoke("network_interfaces", config, None).await
    }

    pub async fn network_interface_default(&self, config: Option<WinRmConfig>) -> ProbeOutcome {
        self.invoke("network_interface_default", config, None).await
    }

    pub async fn network_gateway_default(&self, config: Option<WinRmConfig>) -> ProbeOutcome {
        self.invoke("network_gateway_default", config, None).await
    }

    pub async fn network_connections(&self, config: Option<WinRmConfig>) -> ProbeOutcome {
        self.invoke("network_connections", config, None).await
    }

    /// Counters for `iface`, or for the default interface when `None`
    pub async fn network_stats(
        &self,
        iface: Option<String>,
        config: Option<WinRmConfig>,
    ) -> ProbeOutcome {
        self.invoke("network_stats", config, iface).await
    }

    pub async fn os_info(&self, config: Option<WinRmConfig>) -> ProbeOutcome {
        self.invoke("os_info", config, None).await
    }

    pub async fn cpu(&self, config: Option<WinRmConfig>) -> ProbeOutcome {
        self.invoke("cpu", config, None).await
    }

    pub async fn mem(&self, config: Option<WinRmConfig>) -> ProbeOutcome {
        self.invoke("mem", config, None).await
    }

    pub async fn time(&self, config: Option<WinRmConfig>) -> ProbeOutcome {
        self.invoke("time", config, None).await
    }

    /// Processes whose name contains any comma-separated term of `filter`
    pub async fn processes(
        &self,
        filter: Option<String>,
        config: Option<WinRmConfig>,
    ) -> ProbeOutcome {
        self.invoke("processes", config, filter).await
    }

    /// Services whose name contains any comma-separated term of `filter`
    pub async fn services(
        &self,
        filter: Option<String>,
        config: Option<WinRmConfig>,
    ) -> ProbeOutcome {
        self.invoke("services", config, filter).await
    }
}
