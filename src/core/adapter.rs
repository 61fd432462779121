//! Callback-to-future adaptation
//!
//! Probes report their result through a one-shot [`Reply`] rather than a
//! return value, mirroring the callback contract of the probe library. The
//! adapter turns such a probe into a function returning a future of the
//! replied value.
//!
//! Each probe is registered with an explicit [`ProbeShape`]. `WithParam`
//! probes receive the caller's optional parameter; `Plain` probes are called
//! without it.

use super::context::{ProbeContext, ProbeRuntime};
use super::options::ProbeOptions;
use crate::utils::ProbeError;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Future returned by a probe body
pub type ProbeFuture = BoxFuture<'static, Result<(), ProbeError>>;

/// Future returned by an adapted probe
pub type AdaptedFuture = BoxFuture<'static, Result<Value, ProbeError>>;

type PlainFn = Arc<dyn Fn(ProbeContext, Reply) -> ProbeFuture + Send + Sync>;
type ParamFn = Arc<dyn Fn(ProbeContext, Option<String>, Reply) -> ProbeFuture + Send + Sync>;

/// Call shape of a probe
#[derive(Clone)]
pub enum ProbeShape {
    /// `(context, reply)`
    Plain(PlainFn),
    /// `(context, param, reply)`
    WithParam(ParamFn),
}

/// A named, registered probe
#[derive(Clone)]
pub struct Probe {
    name: &'static str,
    shape: ProbeShape,
}

impl Probe {
    pub fn plain<F, Fut>(name: &'static str, body: F) -> Self
    where
        F: Fn(ProbeContext, Reply) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ProbeError>> + Send + 'static,
    {
        Self {
            name,
            shape: ProbeShape::Plain(Arc::new(move |ctx, reply| body(ctx, reply).boxed())),
        }
    }

    pub fn with_param<F, Fut>(name: &'static str, body: F) -> Self
    where
        F: Fn(ProbeContext, Option<String>, Reply) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ProbeError>> + Send + 'static,
    {
        Self {
            name,
            shape: ProbeShape::WithParam(Arc::new(move |ctx, param, reply| {
                body(ctx, param, reply).boxed()
            })),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn takes_param(&self) -> bool {
        matches!(self.shape, ProbeShape::WithParam(_))
    }
}

/// One-shot result channel handed to a probe
pub struct Reply {
    probe: &'static str,
    tx: oneshot::Sender<Value>,
}

impl Reply {
    /// Report the probe's result
    pub fn send<T: Serialize>(self, value: T) {
        let value = serde_json::to_value(value).unwrap_or_else(|e| {
            tracing::warn!(probe = self.probe, "result is not serializable: {}", e);
            Value::Null
        });
        let _ = self.tx.send(value);
    }

    /// Report "no result"
    pub fn empty(self) {
        let _ = self.tx.send(Value::Null);
    }
}

/// Adapt `probe` into `(options, param) -> Future<Result<Value, ProbeError>>`
///
/// Failures propagate unchanged: context errors, probe errors and panics all
/// surface to the caller. A reply sent before the probe fails still wins.
pub fn adapt(
    probe: Probe,
    runtime: Arc<ProbeRuntime>,
) -> impl Fn(ProbeOptions, Option<String>) -> AdaptedFuture + Clone + Send + Sync + 'static {
    move |options, param| {
        let probe = probe.clone();
        let runtime = runtime.clone();
        async move {
            let ctx = runtime.context(options).await?;
            let (tx, mut rx) = oneshot::channel();
            let reply = Reply {
                probe: probe.name,
                tx,
            };

            let finished = match &probe.shape {
                ProbeShape::Plain(body) => body(ctx, reply).await,
                ProbeShape::WithParam(body) => body(ctx, param, reply).await,
            };

            match finished {
                Ok(()) => rx.await.map_err(|_| ProbeError::NoReply(probe.name)),
                Err(err) => rx.try_recv().map_err(|_| err),
            }
        }
        .boxed()
    }
}
