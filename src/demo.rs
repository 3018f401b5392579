//! Demo application.
//!
//! Two services and a handful of features, written in every integration
//! shape the engine accepts.

use serde_json::{json, Map, Value};
use tracing::info;

use bootline_core::{
    targets, ActionSpec, Declared, ExtensionResult, Handler, Integration, Register, Registrar,
};

/// Prefix of the environment variables the env service collects.
pub(crate) const ENV_PREFIX: &str = "BOOTLINE_";

pub(crate) fn services() -> Vec<Integration> {
    vec![
        Integration::from_register(EnvService {
            prefix: ENV_PREFIX.to_string(),
        }),
        Integration::register("healthz", register_healthz),
    ]
}

pub(crate) fn features() -> Vec<Integration> {
    vec![
        // Explicit action name.
        Integration::register("ft1", |r: &mut Registrar| {
            r.register_action(
                ActionSpec::new(targets::INIT_FEATURE, say("ft1")).with_name("ft1*"),
            );
            Ok(())
        }),
        // Name taken from the integration.
        Integration::register("ft2", |r: &mut Registrar| {
            r.register_action(ActionSpec::new(targets::INIT_FEATURE, say("ft2")));
            Ok(())
        }),
        // Returns its action, and feeds the env service's defaults.
        Integration::register("ft3", |r: &mut Registrar| {
            r.register_action(ActionSpec::new(
                "$ENV_DEFAULTS",
                Handler::sync(|mut env, _| {
                    if env.get("BOOTLINE_MODE").is_none() {
                        env["BOOTLINE_MODE"] = json!("demo");
                    }
                    Ok(Some(env))
                }),
            ));
            Ok(ActionSpec::new(targets::INIT_FEATURE, say("ft3")))
        }),
        Integration::action(ActionSpec::new(targets::INIT_FEATURE, say("ft4")).with_name("ft4")),
        Integration::register("ft5", |_r: &mut Registrar| {
            Ok(vec![ActionSpec::new(targets::INIT_FEATURE, say("ft5"))])
        }),
        Integration::actions(vec![
            ActionSpec::new(targets::INIT_FEATURE, say("ft6")).with_name("ft6"),
            ActionSpec::new(
                "$HEALTHZ",
                Handler::sync(|_, _| Ok(Some(json!({"name": "features", "ok": true})))),
            )
            .with_name("ft6"),
        ]),
        Integration::tuple(targets::INIT_FEATURE, say("ft7a"), Some("ft7a")),
        Integration::action(
            ActionSpec::new(
                targets::START_FEATURE,
                Handler::sync(|_, ctx| {
                    let greeting: String = ctx.get_config_or("demo.greeting", "hello".to_string())?;
                    let mode: String = ctx.get_context_or("env.BOOTLINE_MODE", String::new())?;
                    info!("{} from the {} app", greeting, mode);
                    Ok(None)
                }),
            )
            .with_name("greeter")
            .with_trace(file!()),
        ),
    ]
}

fn say(word: &'static str) -> Handler {
    Handler::sync(move |_, _| {
        info!("{}", word);
        Ok(None)
    })
}

/// Collects prefixed environment variables into the `env` context key.
///
/// Other integrations may fill in defaults through `$ENV_DEFAULTS`, a
/// waterfall over the collected map.
struct EnvService {
    prefix: String,
}

impl Register for EnvService {
    fn name(&self) -> &str {
        "env"
    }

    fn register(&self, r: &mut Registrar) -> ExtensionResult<Declared> {
        r.register_targets([("ENV_DEFAULTS", "env/defaults")]);

        let prefix = self.prefix.clone();
        r.register_action(
            ActionSpec::new(
                targets::START,
                Handler::sync(move |_, ctx| {
                    let vars: Map<String, Value> = std::env::vars()
                        .filter(|(key, _)| key.starts_with(&prefix))
                        .map(|(key, value)| (key, Value::String(value)))
                        .collect();
                    info!("Collected {} environment variable(s)", vars.len());
                    ctx.set_context("env", Value::Object(vars));
                    Ok(None)
                }),
            )
            .with_trace(file!()),
        );

        r.register_action(
            ActionSpec::new(
                targets::INIT_SERVICE,
                Handler::future(|_, ctx| async move {
                    let env: Value = ctx.get_context_or("env", json!({}))?;
                    let env = ctx.create_extension("$ENV_DEFAULTS").waterfall(env).await?;
                    ctx.set_context("env", env);
                    Ok(None)
                }),
            )
            .with_trace(file!()),
        );

        // Only registered when an http service declares the target.
        r.register_action(
            ActionSpec::new(
                "$HTTP_ROUTE?",
                Handler::sync(|_, _| Ok(Some(json!({"method": "GET", "url": "/env"})))),
            )
            .with_trace(file!()),
        );

        Ok(Declared::One(
            ActionSpec::new(
                "$HEALTHZ?",
                Handler::sync(|_, ctx| {
                    let ok = ctx.get_context::<Value>("env").is_ok();
                    Ok(Some(json!({"name": "env", "ok": ok})))
                }),
            )
            .with_trace(file!()),
        ))
    }
}

/// Runs every `$HEALTHZ` check in parallel once services start.
fn register_healthz(r: &mut Registrar) -> ExtensionResult<()> {
    r.register_targets([("HEALTHZ", "healthz/check")]);
    r.register_action(ActionSpec::new(
        targets::START_SERVICE,
        Handler::future(|_, ctx| async move {
            let checks = ctx.create_extension("$HEALTHZ").parallel(Value::Null).await?;
            let checks: Vec<Value> = checks.into_iter().map(|result| result.value).collect();
            let healthy = checks.iter().all(|check| check["ok"] == json!(true));
            info!("{} health check(s), healthy: {}", checks.len(), healthy);
            ctx.set_context("healthz", checks);
            Ok(None)
        }),
    ));
    Ok(())
}
