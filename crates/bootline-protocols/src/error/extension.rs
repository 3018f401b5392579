//! Extension engine errors.

use thiserror::Error;

/// Result alias used by handlers and engine operations.
pub type ExtensionResult<T> = Result<T, ExtensionError>;

#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error("Unknown target \"{0}\"")]
    UnknownTarget(String),

    #[error("{kind} \"{integration}\" defines an invalid target \"{target}\"")]
    InvalidTarget {
        kind: String,
        integration: String,
        target: String,
    },

    #[error("{kind} \"{integration}\" defines an invalid handler")]
    InvalidHandler { kind: String, integration: String },

    #[error("Config not found: path \"{0}\" does not exist")]
    ConfigNotFound(String),

    #[error("Context not found: path \"{0}\" does not exist")]
    ContextNotFound(String),

    #[error("Invalid value at \"{path}\": {message}")]
    InvalidValue { path: String, message: String },

    #[error("Action \"{action}\" on target \"{target}\" failed: {source}")]
    ActionFailed {
        target: String,
        action: String,
        source: Box<ExtensionError>,
    },

    #[error("{0}")]
    Custom(String),
}

impl ExtensionError {
    /// Build a free-form error, typically from inside a handler.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    /// Follow nested `ActionFailed` wrappers down to the error a handler raised.
    pub fn root_cause(&self) -> &ExtensionError {
        match self {
            Self::ActionFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Whether this is a missing-path lookup that a handler may recover from.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ConfigNotFound(_) | Self::ContextNotFound(_))
    }
}
