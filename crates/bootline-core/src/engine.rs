//! Invocation engine.
//!
//! Runs the actions committed to a target under one of four modes:
//!
//! - `sync`: handlers are called immediately, in order. An async handler is
//!   polled once; if it is not done it is detached onto the runtime and
//!   contributes `Null`.
//! - `serial`: each handler is awaited before the next starts.
//! - `parallel`: all handlers start in registration order, each running up
//!   to its first await, then all are awaited. The first error
//!   aborts the invocation and discards partial results.
//! - `waterfall`: each handler receives the previous handler's output.
//!
//! Result lists always follow registration order.

use std::sync::Arc;

use chrono::Utc;
use futures::future::{try_join_all, BoxFuture};
use serde_json::Value;
use tracing::{debug, warn};

use bootline_protocols::{ExtensionError, ExtensionResult, InvocationMode};

use crate::action::{Action, ActionResult};
use crate::context::AppContext;
use crate::handler::{HandlerResult, Started};

/// Result of an invocation.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Per-action results (sync, serial, parallel).
    Results(Vec<ActionResult>),
    /// Final carried value (waterfall).
    Value(Value),
}

impl Outcome {
    /// Per-action results; a waterfall outcome has none.
    pub fn into_results(self) -> Vec<ActionResult> {
        match self {
            Self::Results(results) => results,
            Self::Value(_) => Vec::new(),
        }
    }

    /// Returned values in registration order, or the waterfall value.
    pub fn values(&self) -> Vec<Value> {
        match self {
            Self::Results(results) => results.iter().map(|r| r.value.clone()).collect(),
            Self::Value(value) => vec![value.clone()],
        }
    }
}

/// A prepared invocation of one target, created by
/// [`AppContext::create_extension`].
pub struct ExtensionCall {
    ctx: AppContext,
    target: String,
}

impl ExtensionCall {
    pub(crate) fn new(ctx: AppContext, target: impl Into<String>) -> Self {
        Self {
            ctx,
            target: target.into(),
        }
    }

    /// Run under `mode`.
    pub async fn invoke(&self, args: Value, mode: InvocationMode) -> ExtensionResult<Outcome> {
        match mode {
            InvocationMode::Sync => self.sync(args).map(Outcome::Results),
            InvocationMode::Serial => self.serial(args).await.map(Outcome::Results),
            InvocationMode::Parallel => self.parallel(args).await.map(Outcome::Results),
            InvocationMode::Waterfall => self.waterfall(args).await.map(Outcome::Value),
        }
    }

    /// Call every handler immediately without awaiting.
    pub fn sync(&self, args: Value) -> ExtensionResult<Vec<ActionResult>> {
        let Some((label, actions)) = self.prepare(InvocationMode::Sync)? else {
            return Ok(Vec::new());
        };
        let scope = self.ctx.tracer().begin(&label, InvocationMode::Sync);

        let mut results = Vec::with_capacity(actions.len());
        for (index, action) in actions.into_iter().enumerate() {
            let started_at = Utc::now();
            let result = match action.handler.start(args.clone(), &self.ctx).kick() {
                Started::Ready(result) => result,
                Started::Pending(future) => {
                    detach(future, &label, &action.name);
                    Ok(None)
                }
            };
            scope.record(index, &action, started_at, result.is_ok());

            match result {
                Ok(value) => results.push(ActionResult::new(value, action)),
                Err(e) => {
                    scope.finish(false);
                    return Err(failed(&label, &action, e));
                }
            }
        }

        scope.finish(true);
        Ok(results)
    }

    /// Await each handler in turn, stopping at the first error.
    pub async fn serial(&self, args: Value) -> ExtensionResult<Vec<ActionResult>> {
        let Some((label, actions)) = self.prepare(InvocationMode::Serial)? else {
            return Ok(Vec::new());
        };
        let scope = self.ctx.tracer().begin(&label, InvocationMode::Serial);

        let mut results = Vec::with_capacity(actions.len());
        for (index, action) in actions.into_iter().enumerate() {
            let started_at = Utc::now();
            let result = action.handler.start(args.clone(), &self.ctx).resolve().await;
            scope.record(index, &action, started_at, result.is_ok());

            match result {
                Ok(value) => results.push(ActionResult::new(value, action)),
                Err(e) => {
                    scope.finish(false);
                    return Err(failed(&label, &action, e));
                }
            }
        }

        scope.finish(true);
        Ok(results)
    }

    /// Start every handler, then await them all.
    pub async fn parallel(&self, args: Value) -> ExtensionResult<Vec<ActionResult>> {
        let Some((label, actions)) = self.prepare(InvocationMode::Parallel)? else {
            return Ok(Vec::new());
        };
        let scope = self.ctx.tracer().begin(&label, InvocationMode::Parallel);

        let result = {
            let (label, scope) = (&label, &scope);
            let calls: Vec<_> = actions
                .iter()
                .enumerate()
                .map(|(index, action)| {
                    let started_at = Utc::now();
                    let started = action.handler.start(args.clone(), &self.ctx).kick();
                    async move {
                        let result = started.resolve().await;
                        scope.record(index, action, started_at, result.is_ok());
                        result
                            .map(|value| ActionResult::new(value, action.clone()))
                            .map_err(|e| failed(label, action, e))
                    }
                })
                .collect();
            try_join_all(calls).await
        };

        scope.finish(result.is_ok());
        result
    }

    /// Thread `args` through every handler; returns the final value.
    ///
    /// A handler returning nothing leaves the carried value unchanged.
    pub async fn waterfall(&self, args: Value) -> ExtensionResult<Value> {
        let Some((label, actions)) = self.prepare(InvocationMode::Waterfall)? else {
            return Ok(args);
        };
        let scope = self.ctx.tracer().begin(&label, InvocationMode::Waterfall);

        let mut carried = args;
        for (index, action) in actions.into_iter().enumerate() {
            let started_at = Utc::now();
            let result = action.handler.start(carried.clone(), &self.ctx).resolve().await;
            scope.record(index, &action, started_at, result.is_ok());

            match result {
                Ok(Some(value)) => carried = value,
                Ok(None) => {}
                Err(e) => {
                    scope.finish(false);
                    return Err(failed(&label, &action, e));
                }
            }
        }

        scope.finish(true);
        Ok(carried)
    }

    fn prepare(&self, mode: InvocationMode) -> ExtensionResult<Option<(String, Vec<Arc<Action>>)>> {
        let Some(label) = self.ctx.targets().resolve_str(&self.target)? else {
            debug!("Skipping optional target {} ({})", self.target, mode);
            self.ctx.tracer().begin(&self.target, mode).finish(true);
            return Ok(None);
        };
        let actions = self.ctx.actions().list_for(&label);
        debug!(
            "Invoking {} [{}] with {} action(s)",
            label,
            mode,
            actions.len()
        );
        Ok(Some((label, actions)))
    }
}

fn failed(target: &str, action: &Action, source: ExtensionError) -> ExtensionError {
    ExtensionError::ActionFailed {
        target: target.to_string(),
        action: action.name.clone(),
        source: Box::new(source),
    }
}

/// Hand a still-pending handler to the runtime; its result is discarded.
fn detach(future: BoxFuture<'static, HandlerResult>, target: &str, action: &str) {
    let (target, action) = (target.to_string(), action.to_string());
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            debug!("Detaching pending handler {} on {}", action, target);
            handle.spawn(async move {
                if let Err(e) = future.await {
                    warn!("Detached handler {} on {} failed: {}", action, target, e);
                }
            });
        }
        Err(_) => {
            warn!(
                "No async runtime; dropping pending handler {} on {}",
                action, target
            );
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
