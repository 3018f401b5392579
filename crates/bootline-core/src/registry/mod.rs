//! Registries for targets and committed actions.

mod actions;
mod targets;

pub use actions::ActionStore;
pub use targets::TargetRegistry;
