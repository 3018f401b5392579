//! Application boot.

use std::fmt;
use std::time::Instant;

use serde_json::{json, Value};
use tracing::{debug, error, info, info_span, Instrument};

use bootline_protocols::{targets, ExtensionError, ExtensionResult, TraceMode};

use crate::action::Action;
use crate::context::AppContext;
use crate::handler::Handler;
use crate::integration::{Integration, IntegrationKind};
use crate::lifecycle::{BootPhase, Step, BOOT_SEQUENCE};
use crate::loader::load;

/// Name of the action that runs a settings builder.
pub const SETTINGS_ACTION: &str = "boot app/settings";

/// Initial settings of an application.
#[derive(Debug, Clone)]
pub enum Settings {
    /// Seed the settings tree with a value.
    Value(Value),
    /// Start from `{}` and run a builder during `SETTINGS`.
    ///
    /// Every top-level key of the object the builder returns is written
    /// with `set_config`. Returning nothing is allowed.
    Builder(Handler),
}

impl Default for Settings {
    fn default() -> Self {
        Self::Value(json!({}))
    }
}

impl From<Value> for Settings {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// An application ready to boot.
pub struct App {
    services: Vec<Integration>,
    features: Vec<Integration>,
    settings: Settings,
    context: Value,
    trace: Option<TraceMode>,
}

impl App {
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    pub fn services(&self) -> &[Integration] {
        &self.services
    }

    pub fn features(&self) -> &[Integration] {
        &self.features
    }

    /// Run the whole lifecycle. Any failure halts the boot.
    ///
    /// Settings and context seeds must be JSON objects.
    pub async fn boot(self) -> ExtensionResult<Booted> {
        let App {
            services,
            features,
            settings,
            context,
            trace,
        } = self;

        let (seed, builder) = match settings {
            Settings::Value(value) => (value, None),
            Settings::Builder(handler) => (json!({}), Some(handler)),
        };
        ensure_object("settings", &seed)?;
        ensure_object("context", &context)?;
        let ctx = AppContext::new(seed, context);
        let span = info_span!("boot", boot_id = %ctx.boot_id());

        run(ctx, services, features, builder, trace)
            .instrument(span)
            .await
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("services", &self.services.len())
            .field("features", &self.features.len())
            .field("trace", &self.trace)
            .finish()
    }
}

/// Builder for [`App`].
pub struct AppBuilder {
    services: Vec<Integration>,
    features: Vec<Integration>,
    settings: Settings,
    context: Value,
    trace: Option<TraceMode>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            services: Vec::new(),
            features: Vec::new(),
            settings: Settings::default(),
            context: json!({}),
            trace: None,
        }
    }

    pub fn service(mut self, integration: impl Into<Integration>) -> Self {
        self.services.push(integration.into());
        self
    }

    pub fn services(mut self, integrations: impl IntoIterator<Item = Integration>) -> Self {
        self.services.extend(integrations);
        self
    }

    pub fn feature(mut self, integration: impl Into<Integration>) -> Self {
        self.features.push(integration.into());
        self
    }

    pub fn features(mut self, integrations: impl IntoIterator<Item = Integration>) -> Self {
        self.features.extend(integrations);
        self
    }

    /// Seed the settings tree.
    pub fn settings(mut self, settings: impl Into<Value>) -> Self {
        self.settings = Settings::Value(settings.into());
        self
    }

    /// Build settings with a handler run during `SETTINGS`.
    pub fn settings_builder(mut self, builder: Handler) -> Self {
        self.settings = Settings::Builder(builder);
        self
    }

    /// Seed the runtime context tree.
    pub fn context(mut self, context: impl Into<Value>) -> Self {
        self.context = context.into();
        self
    }

    /// Produce a trace report once the boot finishes.
    pub fn trace(mut self, mode: impl Into<Option<TraceMode>>) -> Self {
        self.trace = mode.into();
        self
    }

    pub fn build(self) -> App {
        App {
            services: self.services,
            features: self.features,
            settings: self.settings,
            context: self.context,
            trace: self.trace,
        }
    }

    /// Build and boot in one go.
    pub async fn boot(self) -> ExtensionResult<Booted> {
        self.build().boot().await
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a successful boot.
#[derive(Clone)]
pub struct Booted {
    /// Settings as they were when the boot finished.
    pub settings: Value,
    /// The live context, still usable for further invocations.
    pub context: AppContext,
    /// Rendered trace report, if one was requested.
    pub trace: Option<String>,
}

impl fmt::Debug for Booted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Booted")
            .field("settings", &self.settings)
            .field("boot_id", &self.context.boot_id())
            .field("trace", &self.trace.is_some())
            .finish()
    }
}

async fn run(
    ctx: AppContext,
    services: Vec<Integration>,
    features: Vec<Integration>,
    builder: Option<Handler>,
    trace: Option<TraceMode>,
) -> ExtensionResult<Booted> {
    info!(
        "Booting application ({} services, {} features)",
        services.len(),
        features.len()
    );
    let started = Instant::now();

    if let Some(builder) = builder {
        register_settings_builder(&ctx, builder)?;
    }

    if let Err(e) = run_sequence(&ctx, &services, &features).await {
        error!("Boot failed during {}: {}", ctx.phase(), e);
        ctx.set_phase(BootPhase::Failed);
        return Err(e);
    }
    ctx.set_phase(BootPhase::Finished);

    let trace = trace.map(|mode| {
        let report = trace_report(&ctx, mode);
        debug!("{}", report);
        report
    });

    info!("Application booted in {}ms", started.elapsed().as_millis());
    Ok(Booted {
        settings: ctx.settings_snapshot(),
        context: ctx,
        trace,
    })
}

async fn run_sequence(
    ctx: &AppContext,
    services: &[Integration],
    features: &[Integration],
) -> ExtensionResult<()> {
    for (phase, step) in BOOT_SEQUENCE {
        ctx.set_phase(*phase);
        match step {
            Step::Load(kind) => {
                let batch = match kind {
                    IntegrationKind::Service => services,
                    IntegrationKind::Feature => features,
                };
                let count = load(ctx, batch, *kind)?;
                info!("Loaded {} {} action(s)", count, kind.label().to_lowercase());
            }
            Step::Invoke(target, mode) => {
                info!("Boot phase: {}", phase);
                ctx.create_extension(*target).invoke(Value::Null, *mode).await?;
            }
        }
    }
    Ok(())
}

fn register_settings_builder(ctx: &AppContext, builder: Handler) -> ExtensionResult<()> {
    let label = ctx
        .targets()
        .resolve_str(targets::SETTINGS)?
        .ok_or_else(|| ExtensionError::UnknownTarget(targets::SETTINGS.to_string()))?;

    let handler = Handler::future(move |args, ctx: AppContext| {
        let builder = builder.clone();
        async move {
            let values = builder.start(args, &ctx).resolve().await?;
            apply_settings(&ctx, values)?;
            Ok(None)
        }
    });

    ctx.actions().commit_all(vec![Action {
        name: SETTINGS_ACTION.to_string(),
        target: label,
        reference: targets::SETTINGS.to_string(),
        handler,
        trace: None,
    }]);
    Ok(())
}

fn apply_settings(ctx: &AppContext, values: Option<Value>) -> ExtensionResult<()> {
    match values {
        None | Some(Value::Null) => Ok(()),
        Some(Value::Object(map)) => {
            for (key, value) in map {
                ctx.set_config(&key, value);
            }
            Ok(())
        }
        Some(other) => Err(ExtensionError::InvalidValue {
            path: SETTINGS_ACTION.to_string(),
            message: format!("settings builder must return an object, got {}", other),
        }),
    }
}

fn ensure_object(path: &str, seed: &Value) -> ExtensionResult<()> {
    if seed.is_object() {
        return Ok(());
    }
    Err(ExtensionError::InvalidValue {
        path: path.to_string(),
        message: format!("seed must be a JSON object, got {}", seed),
    })
}

fn trace_report(ctx: &AppContext, mode: TraceMode) -> String {
    let lines = [
        String::new(),
        "=================".to_string(),
        "Boot Trace:".to_string(),
        "=================".to_string(),
        String::new(),
        ctx.tracer().render(mode),
        String::new(),
    ];
    lines.join("\n")
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
