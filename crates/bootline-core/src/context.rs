//! Shared application context.
//!
//! One [`AppContext`] exists per boot. Clones share the same state: the
//! settings tree, the runtime context tree, the typed service map and the
//! engine (targets, actions, tracer). Writes are visible to every handler
//! invoked afterwards; nothing is snapshotted.

use std::any::Any;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use bootline_protocols::{ExtensionError, ExtensionResult};

use crate::engine::ExtensionCall;
use crate::lifecycle::BootPhase;
use crate::registry::{ActionStore, TargetRegistry};
use crate::tracer::Tracer;
use crate::tree;

type Service = Arc<dyn Any + Send + Sync>;

struct ContextInner {
    boot_id: String,
    phase: AtomicU8,
    targets: TargetRegistry,
    actions: ActionStore,
    tracer: Tracer,
    settings: RwLock<Value>,
    state: RwLock<Value>,
    services: DashMap<String, Service>,
}

/// Context handed to every integration and handler.
#[derive(Clone)]
pub struct AppContext {
    inner: Arc<ContextInner>,
}

impl AppContext {
    /// Create a context seeded with settings and runtime context values.
    ///
    /// The lifecycle targets are pre-registered.
    pub fn new(settings: Value, context: Value) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                boot_id: uuid::Uuid::new_v4().to_string(),
                phase: AtomicU8::new(BootPhase::Created as u8),
                targets: TargetRegistry::with_lifecycle(),
                actions: ActionStore::new(),
                tracer: Tracer::new(),
                settings: RwLock::new(settings),
                state: RwLock::new(context),
                services: DashMap::new(),
            }),
        }
    }

    /// Unique id of this boot, used to correlate log lines.
    pub fn boot_id(&self) -> &str {
        &self.inner.boot_id
    }

    /// Current boot phase.
    pub fn phase(&self) -> BootPhase {
        BootPhase::from(self.inner.phase.load(Ordering::SeqCst))
    }

    pub(crate) fn set_phase(&self, phase: BootPhase) {
        self.inner.phase.store(phase as u8, Ordering::SeqCst);
    }

    pub fn targets(&self) -> &TargetRegistry {
        &self.inner.targets
    }

    pub fn actions(&self) -> &ActionStore {
        &self.inner.actions
    }

    pub fn tracer(&self) -> &Tracer {
        &self.inner.tracer
    }

    /// Declare new targets, `(name, label)`. Takes effect immediately.
    pub fn register_targets<I, K, V>(&self, targets: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.inner.targets.register_targets(targets)
    }

    /// Prepare an invocation of `target` (`$NAME`, `$NAME?` or a label).
    pub fn create_extension(&self, target: impl Into<String>) -> ExtensionCall {
        ExtensionCall::new(self.clone(), target)
    }

    // --- settings -------------------------------------------------------

    /// Read a setting. Fails with `ConfigNotFound` if the path holds nothing.
    pub fn get_config<T: DeserializeOwned>(&self, path: &str) -> ExtensionResult<T> {
        let value = read(&self.inner.settings, path)
            .ok_or_else(|| ExtensionError::ConfigNotFound(path.to_string()))?;
        decode(path, value)
    }

    /// Read a setting, falling back to `default` when the path holds nothing.
    pub fn get_config_or<T: DeserializeOwned>(&self, path: &str, default: T) -> ExtensionResult<T> {
        match read(&self.inner.settings, path) {
            Some(value) => decode(path, value),
            None => Ok(default),
        }
    }

    /// Write a setting, creating intermediate objects.
    pub fn set_config(&self, path: &str, value: impl Into<Value>) {
        tree::set(&mut self.inner.settings.write(), path, value.into());
    }

    /// Copy of the whole settings tree.
    pub fn settings_snapshot(&self) -> Value {
        self.inner.settings.read().clone()
    }

    // --- runtime context ------------------------------------------------

    /// Read a context value. Fails with `ContextNotFound` if the path holds nothing.
    pub fn get_context<T: DeserializeOwned>(&self, path: &str) -> ExtensionResult<T> {
        let value = read(&self.inner.state, path)
            .ok_or_else(|| ExtensionError::ContextNotFound(path.to_string()))?;
        decode(path, value)
    }

    /// Read a context value, falling back to `default`.
    pub fn get_context_or<T: DeserializeOwned>(&self, path: &str, default: T) -> ExtensionResult<T> {
        match read(&self.inner.state, path) {
            Some(value) => decode(path, value),
            None => Ok(default),
        }
    }

    /// Write a context value, creating intermediate objects.
    pub fn set_context(&self, path: &str, value: impl Into<Value>) {
        tree::set(&mut self.inner.state.write(), path, value.into());
    }

    /// Copy of the whole runtime context tree.
    pub fn context_snapshot(&self) -> Value {
        self.inner.state.read().clone()
    }

    // --- typed services -------------------------------------------------

    /// Share a non-JSON value (client, callable, pool) under `key`.
    ///
    /// A later `provide` with the same key replaces the earlier value.
    pub fn provide<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: T) {
        self.inner.services.insert(key.into(), Arc::new(value));
    }

    /// Look up a value shared with [`provide`](Self::provide).
    pub fn resolve<T: Send + Sync + 'static>(&self, key: &str) -> ExtensionResult<Arc<T>> {
        let service = self
            .inner
            .services
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ExtensionError::ContextNotFound(key.to_string()))?;

        service
            .downcast::<T>()
            .map_err(|_| ExtensionError::InvalidValue {
                path: key.to_string(),
                message: format!("not a {}", std::any::type_name::<T>()),
            })
    }

    /// Check if a service was provided under `key`.
    pub fn has_service(&self, key: &str) -> bool {
        self.inner.services.contains_key(key)
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new(json!({}), json!({}))
    }
}

fn read(tree: &RwLock<Value>, path: &str) -> Option<Value> {
    tree::get(&tree.read(), path).cloned()
}

fn decode<T: DeserializeOwned>(path: &str, value: Value) -> ExtensionResult<T> {
    serde_json::from_value(value).map_err(|e| ExtensionError::InvalidValue {
        path: path.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
