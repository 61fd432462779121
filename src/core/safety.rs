//! Outermost failure boundary
//!
//! Whatever the wrapped function does (returns an error, panics while being
//! called, panics while being polled), the future returned by [`safe`]
//! resolves to a [`ProbeOutcome`]. Escaped failures become
//! [`ProbeOutcome::Failed`] carrying the failure's message.

use super::outcome::ProbeOutcome;
use crate::utils::ProbeError;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

pub type SafeFuture = BoxFuture<'static, ProbeOutcome>;

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "probe panicked".to_string()
    }
}

/// Wrap `f` so its future always resolves
///
/// `name` only labels diagnostics.
pub fn safe<A, B, F, Fut>(
    name: &'static str,
    f: F,
) -> impl Fn(A, B) -> SafeFuture + Clone + Send + Sync + 'static
where
    A: Send + 'static,
    B: Send + 'static,
    F: Fn(A, B) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<ProbeOutcome, ProbeError>> + Send + 'static,
{
    move |a, b| {
        let f = f.clone();
        async move {
            // Calling `f` inside the guarded block also covers panics raised
            // before it returns a future.
            let result = AssertUnwindSafe(async move { f(a, b).await })
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| {
                    Err(ProbeError::Panicked(panic_message(payload.as_ref())))
                });

            match result {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::warn!(probe = name, "probe call failed: {}", err);
                    ProbeOutcome::Failed(err.to_string())
                }
            }
        }
        .boxed()
    }
}
