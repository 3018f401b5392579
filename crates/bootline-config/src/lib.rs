//! # Bootline Config
//!
//! Loads the settings an application boots with from TOML, JSON or YAML
//! files, with `${VAR}` environment substitution.

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::{SettingsFormat, SettingsLoader};
