//! Main application run

use std::future::Future;
use std::io::Write;

use tracing::{error, info};

use crate::app::options::AppOptions;
use crate::errors::WatchError;
use crate::github::output::{Reporter, MISSING_PULL_REQUEST};
use crate::http::client::HttpClient;
use crate::models::CorrelationKey;
use crate::watch::{BuildSource, Clock, DeploymentWatcher, SystemClock};
use crate::watch::watcher;

/// Watch the Netlify deploy of `key` and report the outcome.
/// Returns whether the step succeeded.
pub async fn run<W: Write>(
    options: AppOptions,
    key: Option<CorrelationKey>,
    reporter: &mut Reporter<W>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<bool, WatchError> {
    let client = HttpClient::new(
        &options.api_base_url,
        options.token,
        &options.site_id,
        options.request_timeout,
    )?;
    info!(
        "Using Netlify site {} at {}",
        client.site_id(),
        client.base_url()
    );

    watch_and_report(
        client,
        SystemClock,
        &options.watcher,
        key,
        reporter,
        shutdown_signal,
    )
    .await
}

/// Drive one watch against any build source and report it. Every path
/// emits exactly one terminal message.
pub async fn watch_and_report<S, C, W>(
    source: S,
    clock: C,
    options: &watcher::Options,
    key: Option<CorrelationKey>,
    reporter: &mut Reporter<W>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<bool, WatchError>
where
    S: BuildSource,
    C: Clock,
    W: Write,
{
    let Some(key) = key else {
        reporter.set_failed(MISSING_PULL_REQUEST)?;
        return Ok(false);
    };

    let deploy_watcher = DeploymentWatcher::new(source, clock, options.clone());
    let outcome = match deploy_watcher
        .watch_until(Some(key), None, Box::pin(shutdown_signal))
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Watch for Pull Request {} stopped: {}", key, e);
            reporter.set_failed(&format!(
                "Unable to check the deployment for Pull Request {}: {}",
                key, e
            ))?;
            return Ok(false);
        }
    };

    reporter.report(&outcome, key, options).await
}
