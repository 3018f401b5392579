//! # Bootline Core
//!
//! Lifecycle engine that assembles an application out of integrations.
//!
//! ## Components
//!
//! - [`App`] - Boot entry point driving the fixed lifecycle sequence
//! - [`AppContext`] - Shared settings/context trees and engine handle
//! - [`TargetRegistry`] / [`ActionStore`] - Known targets and committed actions
//! - [`ExtensionCall`] - Runs a target's actions in one of four modes
//! - [`Integration`] / [`Registrar`] - How services and features declare work
//!
//! ## Registration protocol
//!
//! Integrations never run actions while loading. Targets they declare take
//! effect immediately, while actions are queued and committed only after the
//! whole batch ran, so integrations may reference each other in any order.

pub mod action;
pub mod app;
pub mod context;
pub mod engine;
pub mod handler;
pub mod integration;
pub mod lifecycle;
pub mod loader;
pub mod registry;
pub mod tracer;
pub mod tree;

pub use action::{Action, ActionResult, ActionSpec};
pub use app::{App, AppBuilder, Booted, Settings};
pub use context::AppContext;
pub use engine::{ExtensionCall, Outcome};
pub use handler::{ActionHandler, Handler, HandlerResult};
pub use integration::{Declared, Integration, IntegrationKind, Register, Registrar};
pub use lifecycle::{BootPhase, Step, BOOT_SEQUENCE};
pub use loader::Loader;
pub use registry::{ActionStore, TargetRegistry};
pub use tracer::{ActionRecord, InvocationRecord, Tracer};

pub use bootline_protocols::{
    targets, ExtensionError, ExtensionResult, InvocationMode, TargetRef, TraceMode,
};
