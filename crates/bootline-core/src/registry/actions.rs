//! Per-target ordered action lists.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::action::Action;

/// Store of committed actions, keyed by target label.
///
/// Actions are only ever appended; submission order is execution order.
pub struct ActionStore {
    actions: DashMap<String, Vec<Arc<Action>>>,
}

impl ActionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            actions: DashMap::new(),
        }
    }

    /// Append a batch of actions, preserving their order. Returns the batch size.
    pub fn commit_all(&self, actions: Vec<Action>) -> usize {
        let count = actions.len();
        for action in actions {
            debug!("Committed action {} -> {}", action.name, action.target);
            self.actions
                .entry(action.target.clone())
                .or_default()
                .push(Arc::new(action));
        }
        count
    }

    /// Ordered actions of a target; empty if none were ever committed.
    pub fn list_for(&self, target: &str) -> Vec<Arc<Action>> {
        self.actions
            .get(target)
            .map(|list| list.clone())
            .unwrap_or_default()
    }

    /// Total number of committed actions.
    pub fn len(&self) -> usize {
        self.actions.iter().map(|list| list.len()).sum()
    }

    /// Check if no action was committed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Labels that have at least one action, sorted.
    pub fn targets(&self) -> Vec<String> {
        let mut labels: Vec<_> = self.actions.iter().map(|entry| entry.key().clone()).collect();
        labels.sort();
        labels
    }
}

impl Default for ActionStore {
    fn default() -> Self {
        Self::new()
    }
}
