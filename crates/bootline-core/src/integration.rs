//! Integrations: the units services and features are written as.
//!
//! Every shape an integration may take is normalized by the
//! [`Loader`](crate::loader::Loader) into a list of actions before anything
//! is committed.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use bootline_protocols::ExtensionResult;

use crate::action::ActionSpec;
use crate::context::AppContext;
use crate::handler::Handler;

/// Whether a batch of integrations are services or features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationKind {
    Service,
    Feature,
}

impl IntegrationKind {
    /// Prefix applied to the names of this kind's actions.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Service => "service ",
            Self::Feature => "feature ",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Service => "Service",
            Self::Feature => "Feature",
        }
    }
}

impl fmt::Display for IntegrationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Actions an integration returns from its register callable.
#[derive(Debug, Default)]
pub enum Declared {
    #[default]
    Nothing,
    One(ActionSpec),
    Many(Vec<ActionSpec>),
}

impl Declared {
    pub fn into_vec(self) -> Vec<ActionSpec> {
        match self {
            Self::Nothing => Vec::new(),
            Self::One(spec) => vec![spec],
            Self::Many(specs) => specs,
        }
    }
}

impl From<()> for Declared {
    fn from(_: ()) -> Self {
        Self::Nothing
    }
}

impl From<ActionSpec> for Declared {
    fn from(spec: ActionSpec) -> Self {
        Self::One(spec)
    }
}

impl From<Vec<ActionSpec>> for Declared {
    fn from(specs: Vec<ActionSpec>) -> Self {
        Self::Many(specs)
    }
}

/// Trait for integrations implemented as types.
pub trait Register: Send + Sync {
    /// Name used for actions that do not set one.
    fn name(&self) -> &str;

    /// Declare targets and queue actions. Must not invoke anything.
    fn register(&self, registrar: &mut Registrar) -> ExtensionResult<Declared>;
}

struct FnRegister<F, D> {
    name: String,
    f: F,
    _declared: PhantomData<fn() -> D>,
}

impl<F, D> Register for FnRegister<F, D>
where
    F: Fn(&mut Registrar) -> ExtensionResult<D> + Send + Sync,
    D: Into<Declared>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn register(&self, registrar: &mut Registrar) -> ExtensionResult<Declared> {
        (self.f)(registrar).map(Into::into)
    }
}

/// A service or feature.
#[derive(Clone)]
pub enum Integration {
    /// A callable that registers targets and actions.
    Register(Arc<dyn Register>),
    /// A single declarative action.
    Action(ActionSpec),
    /// An ordered list of declarative actions.
    Actions(Vec<ActionSpec>),
    /// Legacy `(target, handler, name)` form.
    Tuple {
        target: String,
        handler: Handler,
        name: Option<String>,
    },
}

impl Integration {
    /// Integration backed by a closure.
    pub fn register<F, D>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Registrar) -> ExtensionResult<D> + Send + Sync + 'static,
        D: Into<Declared> + 'static,
    {
        Self::Register(Arc::new(FnRegister {
            name: name.into(),
            f,
            _declared: PhantomData,
        }))
    }

    /// Integration backed by a [`Register`] implementation.
    pub fn from_register(register: impl Register + 'static) -> Self {
        Self::Register(Arc::new(register))
    }

    pub fn action(spec: ActionSpec) -> Self {
        Self::Action(spec)
    }

    pub fn actions(specs: Vec<ActionSpec>) -> Self {
        Self::Actions(specs)
    }

    pub fn tuple(
        target: impl Into<String>,
        handler: impl Into<Handler>,
        name: Option<&str>,
    ) -> Self {
        Self::Tuple {
            target: target.into(),
            handler: handler.into(),
            name: name.map(str::to_string),
        }
    }

    /// Name the integration is known by in logs and in default action names.
    ///
    /// Declarative forms fall back to their (first) action's name, then target.
    pub fn name(&self) -> String {
        match self {
            Self::Register(register) => register.name().to_string(),
            Self::Action(spec) => spec.name.clone().unwrap_or_else(|| spec.target.clone()),
            Self::Actions(specs) => specs
                .first()
                .map(|spec| spec.name.clone().unwrap_or_else(|| spec.target.clone()))
                .unwrap_or_default(),
            Self::Tuple { target, name, .. } => name.clone().unwrap_or_else(|| target.clone()),
        }
    }
}

impl fmt::Debug for Integration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match self {
            Self::Register(_) => "Register",
            Self::Action(_) => "Action",
            Self::Actions(_) => "Actions",
            Self::Tuple { .. } => "Tuple",
        };
        f.debug_struct("Integration")
            .field("shape", &shape)
            .field("name", &self.name())
            .finish()
    }
}

impl From<ActionSpec> for Integration {
    fn from(spec: ActionSpec) -> Self {
        Self::Action(spec)
    }
}

impl From<Vec<ActionSpec>> for Integration {
    fn from(specs: Vec<ActionSpec>) -> Self {
        Self::Actions(specs)
    }
}

/// Qualify an action's name as `prefix + (explicit name or integration name)`.
pub(crate) fn qualify(mut spec: ActionSpec, prefix: &str, integration: &str) -> ActionSpec {
    let base = spec.name.take().unwrap_or_else(|| integration.to_string());
    spec.name = Some(format!("{}{}", prefix, base));
    spec
}

/// Scoped registration API handed to a register callable.
///
/// Target declarations take effect immediately; actions are only queued.
pub struct Registrar {
    ctx: AppContext,
    integration: String,
    kind: IntegrationKind,
    queued: Vec<ActionSpec>,
}

impl Registrar {
    pub(crate) fn new(ctx: AppContext, integration: impl Into<String>, kind: IntegrationKind) -> Self {
        Self {
            ctx,
            integration: integration.into(),
            kind,
            queued: Vec::new(),
        }
    }

    /// Queue an action. Its name defaults to the integration's name.
    pub fn register_action(&mut self, spec: ActionSpec) -> &mut Self {
        let spec = qualify(spec, self.kind.prefix(), &self.integration);
        self.queued.push(spec);
        self
    }

    /// Declare targets other integrations may reference as `$NAME`.
    pub fn register_targets<I, K, V>(&mut self, targets: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.ctx.register_targets(targets);
        self
    }

    /// The shared application context.
    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn integration_name(&self) -> &str {
        &self.integration
    }

    pub fn kind(&self) -> IntegrationKind {
        self.kind
    }

    pub(crate) fn into_queued(self) -> Vec<ActionSpec> {
        self.queued
    }
}
