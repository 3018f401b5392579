//! Two-phase integration loading.
//!
//! A [`Loader`] runs every integration of a batch, queueing the actions they
//! declare, then commits the whole queue in one pass. Target declarations
//! made while running take effect immediately, so an action may reference a
//! target declared by an integration that runs after it.

use tracing::{debug, info};

use bootline_protocols::{ExtensionError, ExtensionResult, TargetRef};

use crate::action::{Action, ActionSpec};
use crate::context::AppContext;
use crate::integration::{qualify, Integration, IntegrationKind, Registrar};

/// Buffers the actions of one batch of integrations.
pub struct Loader {
    ctx: AppContext,
    kind: IntegrationKind,
    queued: Vec<ActionSpec>,
}

impl Loader {
    /// Create a loader for a batch of services or features.
    pub fn new(ctx: AppContext, kind: IntegrationKind) -> Self {
        Self {
            ctx,
            kind,
            queued: Vec::new(),
        }
    }

    /// Run one integration and queue what it declares.
    ///
    /// Returns the number of actions queued for it.
    pub fn run(&mut self, integration: &Integration) -> ExtensionResult<usize> {
        let name = integration.name();
        let prefix = self.kind.prefix();
        info!("Loading {}: {}", self.kind.label().to_lowercase(), name);

        let specs = match integration {
            Integration::Register(register) => {
                let mut registrar = Registrar::new(self.ctx.clone(), name.clone(), self.kind);
                let declared = register.register(&mut registrar)?;
                let mut specs = registrar.into_queued();
                specs.extend(
                    declared
                        .into_vec()
                        .into_iter()
                        .map(|spec| qualify(spec, prefix, &name)),
                );
                specs
            }
            Integration::Action(spec) => vec![qualify(spec.clone(), prefix, &name)],
            Integration::Actions(specs) => specs
                .iter()
                .cloned()
                .map(|spec| qualify(spec, prefix, &name))
                .collect(),
            Integration::Tuple {
                target,
                handler,
                name: explicit,
            } => {
                let mut spec = ActionSpec::new(target.clone(), handler.clone());
                spec.name = explicit.clone();
                vec![qualify(spec, prefix, &name)]
            }
        };

        for spec in &specs {
            self.validate(&name, spec)?;
        }

        let count = specs.len();
        self.queued.extend(specs);
        Ok(count)
    }

    /// Number of actions waiting to be committed.
    pub fn queued(&self) -> usize {
        self.queued.len()
    }

    /// Resolve every queued action and commit the batch.
    ///
    /// Nothing is committed if a required target is unknown. Actions bound
    /// to an unknown optional target are dropped.
    pub fn commit(self) -> ExtensionResult<usize> {
        let mut actions = Vec::with_capacity(self.queued.len());

        for spec in self.queued {
            let name = spec.name.unwrap_or_default();
            let target = TargetRef::parse(&spec.target).ok_or_else(|| ExtensionError::InvalidTarget {
                kind: self.kind.label().to_string(),
                integration: name.clone(),
                target: spec.target.clone(),
            })?;

            let Some(label) = self.ctx.targets().resolve(&target) else {
                if target.is_required() {
                    return Err(ExtensionError::UnknownTarget(target.name().to_string()));
                }
                info!("Skipping {}: optional target {} is not declared", name, target);
                continue;
            };

            actions.push(Action {
                name,
                target: label,
                reference: spec.target,
                handler: spec.handler,
                trace: spec.trace,
            });
        }

        let count = self.ctx.actions().commit_all(actions);
        debug!("Committed {} {} action(s)", count, self.kind.label().to_lowercase());
        Ok(count)
    }

    fn validate(&self, integration: &str, spec: &ActionSpec) -> ExtensionResult<()> {
        if TargetRef::parse(&spec.target).is_none() {
            return Err(ExtensionError::InvalidTarget {
                kind: self.kind.label().to_string(),
                integration: integration.to_string(),
                target: spec.target.clone(),
            });
        }
        if !spec.handler.is_usable() {
            return Err(ExtensionError::InvalidHandler {
                kind: self.kind.label().to_string(),
                integration: integration.to_string(),
            });
        }
        Ok(())
    }
}

/// Run a batch of integrations and commit their actions.
///
/// Returns the number of committed actions.
pub fn load(
    ctx: &AppContext,
    integrations: &[Integration],
    kind: IntegrationKind,
) -> ExtensionResult<usize> {
    let mut loader = Loader::new(ctx.clone(), kind);
    for integration in integrations {
        loader.run(integration)?;
    }
    loader.commit()
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
