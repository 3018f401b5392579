//! End-to-end boot tests.
//!
//! These tests drive complete boots through the public API: integrations in
//! every shape, settings and context access, and cross-integration targets.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};

use bootline_core::{
    targets, ActionSpec, App, AppContext, ExtensionError, ExtensionResult, Handler, Integration,
    Registrar, TraceMode,
};

// ============================================================================
// Test Helpers
// ============================================================================

/// Handler that counts its calls.
fn counter() -> (Handler, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = calls.clone();
    let handler = Handler::sync(move |_, _| {
        counted.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    });
    (handler, calls)
}

/// Handler that records the value of a setting.
fn read_config(path: &'static str, into: &Arc<Mutex<Vec<Value>>>) -> Handler {
    let into = into.clone();
    Handler::sync(move |_, ctx| {
        into.lock().push(ctx.get_config::<Value>(path)?);
        Ok(None)
    })
}

type Compute = Box<dyn Fn(&Value, &AppContext) -> ExtensionResult<i64> + Send + Sync>;

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_empty_app() {
    let booted = App::builder().boot().await.unwrap();
    assert_eq!(booted.settings, json!({}));
    assert!(booted.context.actions().is_empty());
}

#[tokio::test]
async fn test_register_runs_once_per_batch() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = calls.clone();
    let integration = Integration::register("s1", move |_r: &mut Registrar| {
        counted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    App::builder()
        .service(integration.clone())
        .feature(integration)
        .boot()
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_declarative_single_action() {
    let (handler, calls) = counter();
    App::builder()
        .service(ActionSpec::new(targets::INIT_SERVICE, handler))
        .boot()
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_declarative_action_list() {
    let (first, first_calls) = counter();
    let (second, second_calls) = counter();
    App::builder()
        .service(vec![
            ActionSpec::new(targets::INIT_SERVICE, first),
            ActionSpec::new(targets::INIT_SERVICE, second),
        ])
        .boot()
        .await
        .unwrap();

    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_legacy_tuple_form() {
    let (handler, calls) = counter();
    let booted = App::builder()
        .feature(Integration::tuple(targets::INIT_FEATURE, handler, Some("ft7")))
        .boot()
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let actions = booted.context.actions().list_for("init/feature");
    assert_eq!(actions[0].name, "feature ft7");
}

// ============================================================================
// Settings
// ============================================================================

#[tokio::test]
async fn test_settings_builder_is_visible_to_features() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    App::builder()
        .settings_builder(Handler::sync(|_, ctx| {
            ctx.set_config("foo.faa", 22);
            Ok(None)
        }))
        .feature(ActionSpec::new(targets::START_FEATURE, read_config("foo.faa", &seen)))
        .boot()
        .await
        .unwrap();

    assert_eq!(*seen.lock(), vec![json!(22)]);
}

#[tokio::test]
async fn test_config_flows_across_phases() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    App::builder()
        .settings_builder(Handler::sync(|_, ctx| {
            ctx.set_config("foo.faa", 22);
            Ok(None)
        }))
        .service(Integration::register("doubler", |r: &mut Registrar| {
            r.register_action(ActionSpec::new(
                targets::INIT_SERVICE,
                Handler::sync(|_, ctx| {
                    let faa: i64 = ctx.get_config("foo.faa")?;
                    ctx.set_config("foo", faa * 2);
                    Ok(None)
                }),
            ));
            Ok(())
        }))
        .feature(ActionSpec::new(targets::START_FEATURE, read_config("foo", &seen)))
        .boot()
        .await
        .unwrap();

    assert_eq!(*seen.lock(), vec![json!(44)]);
}

#[tokio::test]
async fn test_settings_value_is_not_aliased() {
    let seed = json!({"foo": 1});
    let booted = App::builder()
        .settings(seed.clone())
        .service(ActionSpec::new(
            targets::SETTINGS,
            Handler::sync(|_, ctx| {
                let foo: i64 = ctx.get_config("foo")?;
                ctx.set_config("foo", foo + 1);
                Ok(None)
            }),
        ))
        .boot()
        .await
        .unwrap();

    assert_eq!(booted.settings["foo"], json!(2));
    assert_eq!(seed["foo"], json!(1));
}

#[tokio::test]
async fn test_settings_nested_paths() {
    let booted = App::builder()
        .settings(json!({"foo": 1}))
        .service(ActionSpec::new(
            targets::SETTINGS,
            Handler::sync(|_, ctx| {
                let foo: i64 = ctx.get_config("foo")?;
                ctx.set_config("new.faa.foo", foo + 1);
                Ok(None)
            }),
        ))
        .boot()
        .await
        .unwrap();

    assert_eq!(booted.settings["new"]["faa"]["foo"], json!(2));
}

#[tokio::test]
async fn test_missing_config_fails_boot() {
    let err = App::builder()
        .feature(ActionSpec::new(
            targets::INIT_FEATURE,
            Handler::sync(|_, ctx| {
                ctx.get_config::<i64>("db.port")?;
                Ok(None)
            }),
        ))
        .boot()
        .await
        .unwrap_err();

    assert!(matches!(err.root_cause(), ExtensionError::ConfigNotFound(path) if path == "db.port"));
}

#[tokio::test]
async fn test_missing_config_with_default() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let into = seen.clone();
    App::builder()
        .feature(ActionSpec::new(
            targets::INIT_FEATURE,
            Handler::sync(move |_, ctx| {
                into.lock().push(ctx.get_config_or("db.port", 5432)?);
                Ok(None)
            }),
        ))
        .boot()
        .await
        .unwrap();

    assert_eq!(*seen.lock(), vec![5432]);
}

// ============================================================================
// Invocation from handlers
// ============================================================================

#[tokio::test]
async fn test_context_function_with_every_mode() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let into = seen.clone();

    let provider = Integration::register("compute", |r: &mut Registrar| {
        let compute: Compute = Box::new(|args: &Value, ctx: &AppContext| {
            let increment: i64 = ctx.get_config("increment")?;
            Ok(args["value"].as_i64().unwrap_or(0) + increment)
        });
        r.context().provide("foo", compute);
        Ok(())
    });

    let caller = ActionSpec::new(
        targets::START_SERVICE,
        Handler::future(move |_, ctx: AppContext| {
            let into = into.clone();
            async move {
                let r1 = ctx.create_extension("aaa").sync(json!({"value": 1}))?;
                into.lock().push(r1[0].value.clone());

                let r2 = ctx.create_extension("bbb").serial(json!({"value": 2})).await?;
                into.lock().push(r2[0].value.clone());

                let r3 = ctx.create_extension("ccc").parallel(json!({"value": 3})).await?;
                into.lock().push(r3[0].value.clone());
                Ok(None)
            }
        }),
    );

    let use_foo = || {
        Handler::sync(|args, ctx| {
            let foo = ctx.resolve::<Compute>("foo")?;
            Ok(Some(json!(foo(&args, ctx)?)))
        })
    };

    App::builder()
        .settings(json!({"increment": 1}))
        .services(vec![provider, caller.into()])
        .features(vec![
            Integration::from(ActionSpec::new("aaa", use_foo())),
            Integration::from(ActionSpec::new("bbb", use_foo())),
            Integration::from(ActionSpec::new("ccc", use_foo())),
        ])
        .boot()
        .await
        .unwrap();

    assert_eq!(*seen.lock(), vec![json!(2), json!(3), json!(4)]);
}

#[tokio::test]
async fn test_waterfall_from_a_handler() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let into = seen.clone();

    App::builder()
        .service(Integration::register("pipeline", move |r: &mut Registrar| {
            r.register_targets([("TRANSFORM", "pipeline/transform")]);
            let into = into.clone();
            r.register_action(ActionSpec::new(
                targets::FINISH,
                Handler::future(move |_, ctx: AppContext| {
                    let into = into.clone();
                    async move {
                        let value = ctx.create_extension("$TRANSFORM").waterfall(json!(1)).await?;
                        into.lock().push(value);
                        Ok(None)
                    }
                }),
            ));
            Ok(())
        }))
        .features(vec![
            Integration::from(ActionSpec::new(
                "$TRANSFORM",
                Handler::sync(|x, _| Ok(Some(json!(x.as_i64().unwrap_or(0) + 1)))),
            )),
            Integration::from(ActionSpec::new(
                "$TRANSFORM",
                Handler::sync(|x, _| Ok(Some(json!(x.as_i64().unwrap_or(0) * 2)))),
            )),
        ])
        .boot()
        .await
        .unwrap();

    assert_eq!(*seen.lock(), vec![json!(4)]);
}

// ============================================================================
// Targets
// ============================================================================

fn s1_service() -> Integration {
    Integration::register("s1", |r: &mut Registrar| {
        r.register_targets([("S1", "s1")]);
        r.register_action(ActionSpec::new(
            targets::START_SERVICE,
            Handler::sync(|_, ctx| {
                ctx.create_extension("s1").sync(Value::Null)?;
                Ok(None)
            }),
        ));
        Ok(())
    })
}

#[tokio::test]
async fn test_required_target_by_reference() {
    let (handler, calls) = counter();
    App::builder()
        .service(s1_service())
        .feature(ActionSpec::new("$S1", handler))
        .boot()
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unknown_required_target() {
    let (handler, calls) = counter();
    let err = App::builder()
        .feature(ActionSpec::new("$S1", handler))
        .boot()
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Unknown target \"S1\"");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_optional_target() {
    let (handler, calls) = counter();
    App::builder()
        .feature(ActionSpec::new("$S1?", handler))
        .boot()
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_services_extend_each_other_in_any_order() {
    let (s1_handler, s1_calls) = counter();
    let (s2_handler, s2_calls) = counter();

    let s1 = Integration::register("s1", move |r: &mut Registrar| {
        r.register_targets([("s1", "s1")]);
        r.register_action(ActionSpec::new(
            targets::INIT_SERVICE,
            Handler::sync(|_, ctx| {
                ctx.create_extension("s1").sync(Value::Null)?;
                Ok(None)
            }),
        ));
        r.register_action(ActionSpec::new("$s2", s2_handler.clone()));
        Ok(())
    });

    let s2 = Integration::register("s2", move |r: &mut Registrar| {
        r.register_targets([("s2", "s2")]);
        r.register_action(ActionSpec::new(
            targets::INIT_SERVICE,
            Handler::sync(|_, ctx| {
                ctx.create_extension("s2").sync(Value::Null)?;
                Ok(None)
            }),
        ));
        r.register_action(ActionSpec::new("$s1", s1_handler.clone()));
        Ok(())
    });

    App::builder().services(vec![s1, s2]).boot().await.unwrap();

    assert_eq!(s1_calls.load(Ordering::SeqCst), 1);
    assert_eq!(s2_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_optional_extension_point_of_another_service() {
    let (handler, calls) = counter();

    // No service declares HTTP_ROUTE, so the feature's action is dropped.
    let booted = App::builder()
        .feature(ActionSpec::new("$HTTP_ROUTE?", handler.clone()).with_name("routes"))
        .boot()
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(booted.context.actions().is_empty());

    let http = Integration::register("http", |r: &mut Registrar| {
        r.register_targets([("HTTP_ROUTE", "http/route")]);
        r.register_action(ActionSpec::new(
            targets::START_SERVICE,
            Handler::future(|_, ctx: AppContext| async move {
                ctx.create_extension("$HTTP_ROUTE").serial(Value::Null).await?;
                Ok(None)
            }),
        ));
        Ok(())
    });
    App::builder()
        .service(http)
        .feature(ActionSpec::new("$HTTP_ROUTE?", handler).with_name("routes"))
        .boot()
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// ============================================================================
// Trace
// ============================================================================

#[tokio::test]
async fn test_trace_lists_actions_in_boot_order() {
    let booted = App::builder()
        .service(ActionSpec::new(targets::START, json!(1)).with_name("env"))
        .feature(ActionSpec::new(targets::FINISH, json!(2)).with_name("ready"))
        .trace(TraceMode::Compact)
        .boot()
        .await
        .unwrap();

    let trace = booted.trace.unwrap();
    let start = trace.find("service env").unwrap();
    let finish = trace.find("feature ready").unwrap();
    assert!(start < finish);
}
