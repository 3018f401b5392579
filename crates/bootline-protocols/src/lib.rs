//! # Bootline Protocols
//!
//! Shared definitions for the bootline lifecycle engine.
//! Contains only vocabulary types - no engine state.
//!
//! ## Contents
//!
//! - [`TargetRef`] - Parsed target references (`$NAME`, `$NAME?`, `label`)
//! - [`InvocationMode`] - The four ways a target's actions can be run
//! - [`TraceMode`] - Boot trace rendering styles
//! - [`ExtensionError`] - The engine-wide error type
//! - [`targets`] - The pre-registered lifecycle phases

pub mod error;
pub mod mode;
pub mod target;

pub use error::{ExtensionError, ExtensionResult};
pub use mode::{InvocationMode, TraceMode};
pub use target::{targets, TargetRef, OPTIONAL_MARKER, SYMBOL_PREFIX};
