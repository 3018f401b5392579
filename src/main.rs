//! bootline - application bootstrap runtime
//!
//! Main entry point for the bootline CLI.

mod cli;
mod demo;

use std::path::{Path, PathBuf};

use clap::Parser;
use serde_json::{json, Value};
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bootline_config::SettingsLoader;
use bootline_core::{App, AppContext, IntegrationKind, Loader};

use cli::{Cli, Commands, RunArgs};

fn bootline_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".bootline"))
        .unwrap_or_else(|| PathBuf::from(".bootline"))
}

/// Initialize tracing with a console layer and, when `log_dir` is set, a
/// daily rolling file layer.
fn init_tracing(log_dir: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("bootline")
                .filename_suffix("log")
                .max_log_files(30)
                .build(dir)?;

            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            // Keep the writer alive for the program duration
            static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
                std::sync::OnceLock::new();
            let _ = GUARD.set(guard);

            Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
        }
        None => None,
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(true)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_dir.as_deref())?;

    match cli.command.unwrap_or_else(|| Commands::Run(RunArgs::default())) {
        Commands::Run(args) => run(args).await,
        Commands::Targets => list_targets(),
    }
}

/// Boot the demo application and print its final settings.
async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let settings = load_settings(args.settings.as_deref())?;
    let context = parse_context(args.context.as_deref())?;

    let booted = App::builder()
        .settings(settings)
        .context(context)
        .services(demo::services())
        .features(demo::features())
        .trace(args.trace)
        .boot()
        .await?;

    if let Some(trace) = &booted.trace {
        println!("{}", trace);
    }

    info!(
        "Booted {} with {} action(s)",
        booted.context.boot_id(),
        booted.context.actions().len()
    );
    println!("{}", serde_json::to_string_pretty(&booted.settings)?);
    Ok(())
}

/// Parse `--context`, which must hold a JSON object.
fn parse_context(raw: Option<&str>) -> Result<Value, Box<dyn std::error::Error>> {
    let Some(raw) = raw else {
        return Ok(json!({}));
    };
    let context: Value = serde_json::from_str(raw)?;
    if !context.is_object() {
        return Err(format!("--context must be a JSON object, got {}", context).into());
    }
    Ok(context)
}

/// Explicit file, else `~/.bootline/settings.toml` when present, else `{}`.
fn load_settings(path: Option<&Path>) -> Result<Value, Box<dyn std::error::Error>> {
    let path = match path {
        Some(path) => PathBuf::from(SettingsLoader::expand_path(&path.to_string_lossy())),
        None => {
            let default = bootline_dir().join("settings.toml");
            if !default.exists() {
                return Ok(json!({}));
            }
            default
        }
    };

    info!("Loading settings from {}", path.display());
    Ok(SettingsLoader::load(&path)?)
}

/// Print the lifecycle targets plus those the demo services declare.
fn list_targets() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = AppContext::default();
    let mut loader = Loader::new(ctx.clone(), IntegrationKind::Service);
    for service in demo::services() {
        loader.run(&service)?;
    }

    for (name, label) in ctx.targets().list() {
        println!("{:<16} {}", name, label);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_context_defaults_to_empty_object() {
        assert_eq!(parse_context(None).unwrap(), json!({}));
    }

    #[test]
    fn test_parse_context_accepts_object() {
        let context = parse_context(Some(r#"{"tenant": "acme"}"#)).unwrap();
        assert_eq!(context["tenant"], json!("acme"));
    }

    #[test]
    fn test_parse_context_rejects_non_object() {
        let err = parse_context(Some("[1, 2, 3]")).unwrap_err();
        assert!(err.to_string().contains("must be a JSON object"));
        assert!(parse_context(Some("not json")).is_err());
    }
}
