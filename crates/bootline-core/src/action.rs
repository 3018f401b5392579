//! Declarative and committed actions.

use std::sync::Arc;

use serde_json::Value;

use crate::handler::Handler;

/// A declarative action as written by an integration.
///
/// `target` is a raw target reference (`$NAME`, `$NAME?` or a literal label).
#[derive(Debug, Clone)]
pub struct ActionSpec {
    pub name: Option<String>,
    pub target: String,
    pub handler: Handler,
    pub trace: Option<String>,
}

impl ActionSpec {
    /// Create a new declarative action.
    pub fn new(target: impl Into<String>, handler: impl Into<Handler>) -> Self {
        Self {
            name: None,
            target: target.into(),
            handler: handler.into(),
            trace: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Record where the action was declared, shown in the boot trace.
    pub fn with_trace(mut self, source: impl Into<String>) -> Self {
        self.trace = Some(source.into());
        self
    }
}

/// An action committed to the store. Immutable once committed.
#[derive(Debug, Clone)]
pub struct Action {
    /// Qualified name, e.g. `service env`.
    pub name: String,
    /// Resolved target label.
    pub target: String,
    /// The reference the action was declared against.
    pub reference: String,
    pub handler: Handler,
    pub trace: Option<String>,
}

/// Result of one action within a sync, serial or parallel invocation.
#[derive(Debug, Clone)]
pub struct ActionResult {
    /// The handler's return value, `Null` when it returned nothing.
    pub value: Value,
    pub action: Arc<Action>,
}

impl ActionResult {
    pub(crate) fn new(value: Option<Value>, action: Arc<Action>) -> Self {
        Self {
            value: value.unwrap_or(Value::Null),
            action,
        }
    }

    /// Name of the action that produced this result.
    pub fn name(&self) -> &str {
        &self.action.name
    }
}
