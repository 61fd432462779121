//! Remote redirection wrapper
//!
//! Retargets an adapted probe at a remote Windows host. The caller's config is
//! copied into fresh options whose platform is forced to Windows; the probe
//! itself is unchanged. Failures never leave this layer: errors, panics and
//! null results all become [`ProbeOutcome::Empty`].

use super::adapter::AdaptedFuture;
use super::options::ProbeOptions;
use super::outcome::ProbeOutcome;
use super::platform::Platform;
use super::safety::panic_message;
use crate::models::WinRmConfig;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;

pub type RemoteFuture = BoxFuture<'static, ProbeOutcome>;

/// Options for a call made with `config`
///
/// A present config always yields Windows, whatever platform the caller
/// asked for. No config means local execution on the host platform.
pub fn remote_options(config: Option<WinRmConfig>) -> ProbeOptions {
    let Some(config) = config else {
        return ProbeOptions::local();
    };

    let WinRmConfig {
        winrm,
        host,
        port,
        username,
        password,
        platform: _,
    } = config;

    ProbeOptions {
        platform: Some(Platform::Windows.as_str().to_string()),
        remote: Some(WinRmConfig {
            winrm,
            host,
            port,
            username,
            password,
            platform: None,
        }),
    }
}

/// Wrap an adapted probe as `(config, param) -> Future<ProbeOutcome>`
pub fn remote<F>(
    adapted: F,
) -> impl Fn(Option<WinRmConfig>, Option<String>) -> RemoteFuture + Clone + Send + Sync + 'static
where
    F: Fn(ProbeOptions, Option<String>) -> AdaptedFuture + Clone + Send + Sync + 'static,
{
    move |config, param| {
        let adapted = adapted.clone();
        async move {
            let endpoint = config.as_ref().map(WinRmConfig::endpoint);
            let options = remote_options(config);

            let result = AssertUnwindSafe(async move { adapted(options, param).await })
                .catch_unwind()
                .await;

            match result {
                Ok(Ok(value)) => ProbeOutcome::from_value(value),
                Ok(Err(err)) => {
                    tracing::warn!(endpoint = ?endpoint, "probe failed, returning empty result: {}", err);
                    ProbeOutcome::Empty
                }
                Err(payload) => {
                    tracing::warn!(
                        endpoint = ?endpoint,
                        "probe panicked, returning empty result: {}",
                        panic_message(payload.as_ref())
                    );
                    ProbeOutcome::Empty
                }
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SecureString;
    use crate::utils::{ProbeError, SessionError};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    fn config() -> WinRmConfig {
        let mut cfg = WinRmConfig::new("srv01", 5986, "admin", SecureString::new("pw"));
        cfg.platform = Some("linux".into());
        cfg
    }

    fn failing_with(
        err: fn() -> ProbeError,
    ) -> impl Fn(ProbeOptions, Option<String>) -> AdaptedFuture + Clone + Send + Sync + 'static {
        move |_options, _param| async move { Err(err()) }.boxed()
    }

    #[test]
    fn config_forces_windows_and_drops_caller_platform() {
        let options = remote_options(Some(config()));
        assert_eq!(options.platform(), Some(Platform::Windows));
        let remote = options.remote.unwrap();
        assert!(remote.winrm);
        assert_eq!(remote.host, "srv01");
        assert_eq!(remote.port, 5986);
        assert_eq!(remote.username, "admin");
        assert_eq!(remote.password.as_str(), "pw");
        assert!(remote.platform.is_none());
    }

    #[test]
    fn no_config_means_local_options() {
        let options = remote_options(None);
        assert!(options.platform.is_none());
        assert!(options.remote.is_none());
    }

    #[tokio::test]
    async fn any_error_becomes_empty() {
        let errors: [fn() -> ProbeError; 4] = [
            || ProbeError::Parse("bad".into()),
            || ProbeError::Session(SessionError::Authentication),
            || ProbeError::NoReply("cpu"),
            || ProbeError::Exec("exit 1".into()),
        ];
        for err in errors {
            let call = remote(failing_with(err));
            assert_eq!(call(Some(config()), None).await, ProbeOutcome::Empty);
            assert_eq!(call(None, None).await, ProbeOutcome::Empty);
        }
    }

    #[tokio::test]
    async fn null_becomes_empty_and_values_pass_through() {
        let null = remote(|_o: ProbeOptions, _p: Option<String>| async { Ok(Value::Null) }.boxed());
        assert_eq!(null(None, None).await, ProbeOutcome::Empty);

        let value = remote(|_o: ProbeOptions, p: Option<String>| {
            async move { Ok(json!({ "param": p })) }.boxed()
        });
        assert_eq!(
            value(None, Some("eth0".into())).await,
            ProbeOutcome::Ok(json!({ "param": "eth0" }))
        );
    }

    #[tokio::test]
    async fn panics_become_empty() {
        fn explode() -> Result<Value, ProbeError> {
            panic!("boom")
        }
        let call = remote(|_o: ProbeOptions, _p: Option<String>| async { explode() }.boxed());
        assert_eq!(call(Some(config()), None).await, ProbeOutcome::Empty);
    }

    #[tokio::test]
    async fn wrapped_function_sees_forced_options_and_original_param() {
        let seen = Arc::new(Mutex::new(None));
        let record = seen.clone();
        let call = remote(move |options: ProbeOptions, param: Option<String>| {
            *record.lock().unwrap() = Some((options.platform(), options.is_remote(), param));
            async { Ok(json!(true)) }.boxed()
        });

        call(Some(config()), Some("Ethernet".into())).await;
        assert_eq!(
            seen.lock().unwrap().clone(),
            Some((Some(Platform::Windows), true, Some("Ethernet".to_string())))
        );
    }
}
