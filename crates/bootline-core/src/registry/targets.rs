//! Target registry mapping symbolic names to labels.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, warn};

use bootline_protocols::{targets, ExtensionError, ExtensionResult, TargetRef};

/// Registry of known targets.
///
/// Declarations are additive: declaring a known name again keeps the first
/// label, so actions already resolved against it stay reachable.
pub struct TargetRegistry {
    targets: DashMap<String, String>,
}

impl TargetRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            targets: DashMap::new(),
        }
    }

    /// Create a registry holding the lifecycle targets.
    pub fn with_lifecycle() -> Self {
        let registry = Self::new();
        registry.register_targets(targets::LIFECYCLE.iter().copied());
        registry
    }

    /// Declare a single target. Returns `true` if the name was new.
    pub fn register(&self, name: impl Into<String>, label: impl Into<String>) -> bool {
        let name = name.into();
        let label = label.into();

        match self.targets.entry(name) {
            Entry::Occupied(existing) => {
                if existing.get() != &label {
                    warn!(
                        "Target {} already declared as \"{}\", ignoring label \"{}\"",
                        existing.key(),
                        existing.get(),
                        label
                    );
                }
                false
            }
            Entry::Vacant(slot) => {
                debug!("Declared target {} -> {}", slot.key(), label);
                slot.insert(label);
                true
            }
        }
    }

    /// Declare several targets. Returns how many names were new.
    pub fn register_targets<I, K, V>(&self, targets: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        targets
            .into_iter()
            .map(|(name, label)| self.register(name, label))
            .filter(|added| *added)
            .count()
    }

    /// Label of a declared name.
    pub fn label(&self, name: &str) -> Option<String> {
        self.targets.get(name).map(|label| label.clone())
    }

    /// Check if a name is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.targets.contains_key(name)
    }

    /// Resolve a parsed reference to the label actions are stored under.
    ///
    /// Literal references always resolve to themselves.
    pub fn resolve(&self, target: &TargetRef) -> Option<String> {
        if target.is_symbolic() {
            self.label(target.name())
        } else {
            Some(target.name().to_string())
        }
    }

    /// Resolve a raw reference for invocation.
    ///
    /// `Ok(None)` means an unknown optional target; an unknown required one
    /// (or an unparseable reference) is an error.
    pub fn resolve_str(&self, raw: &str) -> ExtensionResult<Option<String>> {
        let target =
            TargetRef::parse(raw).ok_or_else(|| ExtensionError::UnknownTarget(raw.to_string()))?;

        match self.resolve(&target) {
            Some(label) => Ok(Some(label)),
            None if target.is_required() => {
                Err(ExtensionError::UnknownTarget(target.name().to_string()))
            }
            None => Ok(None),
        }
    }

    /// All declared targets as `(name, label)`, sorted by name.
    pub fn list(&self) -> Vec<(String, String)> {
        let mut all: Vec<_> = self
            .targets
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        all.sort();
        all
    }

    /// Get the number of declared targets.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl Default for TargetRegistry {
    fn default() -> Self {
        Self::new()
    }
}
