//! Action handlers.
//!
//! A handler is a synchronous callable, an asynchronous one, or a constant
//! value returned as-is. Every handler receives the invocation payload and
//! the shared [`AppContext`].

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;

use bootline_protocols::ExtensionResult;

use crate::context::AppContext;

/// What a handler produces. `None` means "no value"; in a waterfall the
/// carried payload then passes through unchanged.
pub type HandlerResult = ExtensionResult<Option<Value>>;

type SyncFn = dyn Fn(Value, &AppContext) -> HandlerResult + Send + Sync;

/// Trait for asynchronous handlers implemented as types.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Handle one invocation.
    async fn handle(&self, args: Value, ctx: AppContext) -> HandlerResult;
}

/// A registered handler.
#[derive(Clone)]
pub enum Handler {
    Sync(Arc<SyncFn>),
    Async(Arc<dyn ActionHandler>),
    Value(Value),
}

impl Handler {
    /// Handler that runs to completion when called.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(Value, &AppContext) -> HandlerResult + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(f))
    }

    /// Handler backed by an async closure.
    pub fn future<F, Fut>(f: F) -> Self
    where
        F: Fn(Value, AppContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::Async(Arc::new(FutureFn(f)))
    }

    /// Handler backed by an [`ActionHandler`] implementation.
    pub fn from_handler(handler: impl ActionHandler + 'static) -> Self {
        Self::Async(Arc::new(handler))
    }

    /// Constant handler.
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    /// Whether this handler can be registered. A null constant counts as missing.
    pub fn is_usable(&self) -> bool {
        !matches!(self, Self::Value(Value::Null))
    }

    /// Start the handler. Synchronous handlers and constants complete here.
    pub(crate) fn start(&self, args: Value, ctx: &AppContext) -> Started {
        match self {
            Self::Sync(f) => Started::Ready(f(args, ctx)),
            Self::Value(value) => Started::Ready(Ok(Some(value.clone()))),
            Self::Async(handler) => {
                let handler = handler.clone();
                let ctx = ctx.clone();
                Started::Pending(Box::pin(async move { handler.handle(args, ctx).await }))
            }
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("Handler::Sync"),
            Self::Async(_) => f.write_str("Handler::Async"),
            Self::Value(value) => f.debug_tuple("Handler::Value").field(value).finish(),
        }
    }
}

impl From<Value> for Handler {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// A handler call that has been started.
pub(crate) enum Started {
    Ready(HandlerResult),
    Pending(BoxFuture<'static, HandlerResult>),
}

impl Started {
    /// Poll a pending handler once so its body runs up to its first await.
    ///
    /// A handler that finishes on that poll becomes `Ready`.
    pub(crate) fn kick(self) -> Self {
        match self {
            Self::Pending(mut future) => {
                let waker = futures::task::noop_waker();
                let mut cx = Context::from_waker(&waker);
                match future.as_mut().poll(&mut cx) {
                    Poll::Ready(result) => Self::Ready(result),
                    Poll::Pending => Self::Pending(future),
                }
            }
            ready => ready,
        }
    }

    pub(crate) async fn resolve(self) -> HandlerResult {
        match self {
            Self::Ready(result) => result,
            Self::Pending(future) => future.await,
        }
    }
}

struct FutureFn<F>(F);

#[async_trait]
impl<F, Fut> ActionHandler for FutureFn<F>
where
    F: Fn(Value, AppContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn handle(&self, args: Value, ctx: AppContext) -> HandlerResult {
        (self.0)(args, ctx).await
    }
}
