//! Retry with exponential backoff for transient WinRM failures
//!
//! Remote commands can fail because the target is briefly unreachable or the
//! WinRM service is overloaded. Those failures are retried; credential and
//! authorization failures are returned immediately.

use crate::utils::SessionError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retry attempts after the initial one
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Fail on the first error
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Default backoff with a custom attempt budget
    pub fn with_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Delay following `current`, before jitter, capped at `max_delay`
    fn next_base_delay(&self, current: Duration) -> Duration {
        let next_ms = (current.as_millis() as f64 * self.backoff_multiplier) as u64;
        Duration::from_millis(next_ms).min(self.max_delay)
    }
}

/// Retry an async operation while `is_retryable` accepts its error
///
/// ```ignore
/// let out = retry_with_backoff(
///     RetryConfig::default(),
///     || session.run_once(script),
///     is_transient_session_error,
/// ).await?;
/// ```
pub async fn retry_with_backoff<T, E, F, Fut, P>(
    config: RetryConfig,
    mut operation: F,
    is_retryable: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(err) => {
                attempt += 1;
                if attempt > config.max_retries || !is_retryable(&err) {
                    return Err(err);
                }

                tracing::debug!(
                    attempt,
                    max_attempts = config.max_retries + 1,
                    ?delay,
                    "retrying after transient failure: {}",
                    err
                );
                sleep(delay).await;

                // ±20% jitter keeps parallel probes from hammering a host in lockstep
                let base = config.next_base_delay(delay);
                let jitter = rand::thread_rng().gen_range(0.8..=1.2);
                delay = Duration::from_millis((base.as_millis() as f64 * jitter) as u64);
            }
        }
    }
}

/// Whether a WinRM/PowerShell error message describes a transient condition
pub fn is_transient_error(error_msg: &str) -> bool {
    const NON_RETRYABLE: &[&str] = &[
        "access denied",
        "access is denied",
        "invalid credentials",
        "authentication failed",
        "trustedhosts",
        "logon failure",
        "unauthorized",
    ];
    const RETRYABLE: &[&str] = &[
        "timeout",
        "timed out",
        "connection refused",
        "actively refused",
        "network unreachable",
        "no route to host",
        "temporarily unavailable",
        "service not responding",
        "connection reset",
        "dns",
        "could not resolve",
    ];

    let lowercase = error_msg.to_lowercase();
    if NON_RETRYABLE.iter().any(|p| lowercase.contains(p)) {
        return false;
    }
    RETRYABLE.iter().any(|p| lowercase.contains(p))
}

/// Classify a session error for [`retry_with_backoff`]
pub fn is_transient_session_error(err: &SessionError) -> bool {
    match err {
        SessionError::Authentication => false,
        SessionError::Connection(msg)
        | SessionError::WinRm(msg)
        | SessionError::CommandFailed(msg) => is_transient_error(msg),
    }
}
