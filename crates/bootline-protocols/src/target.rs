//! Target references and the built-in lifecycle targets.
//!
//! A target reference is either symbolic (`$NAME`), resolved through the
//! target registry to the label the name was declared with, or a literal
//! extension point label. A trailing `?` marks the reference optional.

use std::fmt;

/// Prefix marking a symbolic target reference.
pub const SYMBOL_PREFIX: char = '$';

/// Suffix marking an optional target reference.
pub const OPTIONAL_MARKER: char = '?';

/// A parsed target reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetRef {
    name: String,
    symbolic: bool,
    required: bool,
}

impl TargetRef {
    /// Parse a raw reference. Returns `None` when no usable name remains.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (body, required) = match raw.strip_suffix(OPTIONAL_MARKER) {
            Some(body) => (body, false),
            None => (raw, true),
        };
        let (name, symbolic) = match body.strip_prefix(SYMBOL_PREFIX) {
            Some(name) => (name, true),
            None => (body, false),
        };

        if name.is_empty() || name.contains(char::is_whitespace) {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            symbolic,
            required,
        })
    }

    /// The bare name, without `$` or `?`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the name must be looked up in the target registry.
    pub fn is_symbolic(&self) -> bool {
        self.symbolic
    }

    /// Whether an unresolvable reference is fatal.
    pub fn is_required(&self) -> bool {
        self.required
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.symbolic {
            write!(f, "{}", SYMBOL_PREFIX)?;
        }
        f.write_str(&self.name)?;
        if !self.required {
            write!(f, "{}", OPTIONAL_MARKER)?;
        }
        Ok(())
    }
}

/// Lifecycle phases pre-registered by every application.
pub mod targets {
    pub const START: &str = "$START";
    pub const SETTINGS: &str = "$SETTINGS";
    pub const INIT_SERVICES: &str = "$INIT_SERVICES";
    pub const INIT_SERVICE: &str = "$INIT_SERVICE";
    pub const INIT_FEATURES: &str = "$INIT_FEATURES";
    pub const INIT_FEATURE: &str = "$INIT_FEATURE";
    pub const START_SERVICES: &str = "$START_SERVICES";
    pub const START_SERVICE: &str = "$START_SERVICE";
    pub const START_FEATURES: &str = "$START_FEATURES";
    pub const START_FEATURE: &str = "$START_FEATURE";
    pub const FINISH: &str = "$FINISH";

    /// Symbolic name and label of every lifecycle target, in boot order.
    pub const LIFECYCLE: &[(&str, &str)] = &[
        ("START", "start"),
        ("SETTINGS", "settings"),
        ("INIT_SERVICES", "init/services"),
        ("INIT_SERVICE", "init/service"),
        ("INIT_FEATURES", "init/features"),
        ("INIT_FEATURE", "init/feature"),
        ("START_SERVICES", "start/services"),
        ("START_SERVICE", "start/service"),
        ("START_FEATURES", "start/features"),
        ("START_FEATURE", "start/feature"),
        ("FINISH", "finish"),
    ];
}
