//! Netlify Deploy Watch - Entry Point
//!
//! Runs as a GitHub Actions step on `pull_request` events. Waits for the
//! Netlify deploy preview of the pull request and publishes its URL as the
//! `deployUrl` output, or fails the step.

use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use deploy_watch::app::run::run;
use deploy_watch::app::settings::Settings;
use deploy_watch::github::{PullRequestEvent, Reporter};
use deploy_watch::logs::init_logging;
use deploy_watch::models::CorrelationKey;
use deploy_watch::utils::{parse_cli_args, version_info};

use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let cli_args = parse_cli_args(env::args().skip(1));

    // Print version and exit
    if cli_args.contains_key("version") {
        return match serde_json::to_string_pretty(&version_info()) {
            Ok(version) => {
                println!("{version}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to render version info: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let mut settings = match load_settings(&cli_args).await {
        Ok(settings) => settings,
        Err(e) => return fail(&format!("Invalid configuration: {e:#}")),
    };
    let key = match resolve_key(&settings).await {
        Ok(key) => key,
        Err(e) => return fail(&format!("{e:#}")),
    };
    let output_file = settings.output_file.take();

    let options = match settings.into_options() {
        Ok(options) => options,
        Err(e) => return fail(&format!("Invalid configuration: {e}")),
    };

    // Initialize logging
    if let Err(e) = init_logging(&options.log) {
        eprintln!("Failed to initialize logging: {e}");
    }

    info!("Running deploy watch with options: {:?}", options);
    let mut reporter = Reporter::new(std::io::stdout(), output_file);
    match run(options, key, &mut reporter, await_shutdown_signal()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("Failed to report the deploy outcome: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Settings from an optional JSON file, the action inputs, then the command line
async fn load_settings(cli_args: &HashMap<String, String>) -> anyhow::Result<Settings> {
    let mut settings = match cli_args.get("config") {
        Some(path) => Settings::read_json(Path::new(path))
            .await
            .with_context(|| format!("reading {path}"))?,
        None => Settings::default(),
    };

    let vars = env::vars_os().filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)));
    settings
        .apply_env(vars)
        .context("reading action inputs")?;
    settings
        .apply_args(cli_args)
        .context("reading command-line arguments")?;
    Ok(settings)
}

/// Pull request from an explicit setting, else from the event payload
async fn resolve_key(settings: &Settings) -> anyhow::Result<Option<CorrelationKey>> {
    if let Some(number) = settings.pull_request {
        return Ok(Some(CorrelationKey::new(number)?));
    }
    match &settings.event_path {
        Some(path) => {
            let event = PullRequestEvent::read(path)
                .await
                .with_context(|| format!("reading event payload {}", path.display()))?;
            Ok(event.correlation_key())
        }
        None => Ok(None),
    }
}

/// Report a failure that happened before the watch could start
fn fail(message: &str) -> ExitCode {
    let mut reporter = Reporter::new(std::io::stdout(), None);
    if let Err(e) = reporter.set_failed(message) {
        eprintln!("{message} ({e})");
    }
    ExitCode::FAILURE
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigterm, mut sigint) = match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
            (Err(e), _) | (_, Err(e)) => {
                warn!("Unable to listen for shutdown signals: {e}");
                return futures::future::pending().await;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl+C received, shutting down..."),
            Err(e) => {
                warn!("Unable to listen for Ctrl+C: {e}");
                futures::future::pending::<()>().await;
            }
        }
    }
}
