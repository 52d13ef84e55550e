//! Deployment watcher
//!
//! Polls the build source until the deploy for a pull request is ready,
//! fails, or the time budget runs out. Each call to [`DeploymentWatcher::watch`]
//! is self-contained: the start instant, the FSM and the loop variables are
//! all local to the call.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::WatchError;
use crate::models::{CorrelationKey, DeployState, PollOutcome};
use crate::watch::clock::Clock;
use crate::watch::fsm::{WatchEvent, WatchFsm};
use crate::watch::source::BuildSource;

/// Default total budget
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Fixed delay between polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// What to do when the provider call itself fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorPolicy {
    /// Log and treat the cycle as "no match", try again next interval
    #[default]
    Retry,

    /// Abort the watch with the provider error
    FailFast,
}

/// Watcher options
#[derive(Debug, Clone)]
pub struct Options {
    /// Delay between polls
    pub poll_interval: Duration,

    /// Budget used when the caller does not pass one
    pub total_timeout: Duration,

    /// Budget for finding a matching build at all
    pub discovery_timeout: Option<Duration>,

    /// Handling of provider failures
    pub provider_errors: ProviderErrorPolicy,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            total_timeout: DEFAULT_TIMEOUT,
            discovery_timeout: None,
            provider_errors: ProviderErrorPolicy::Retry,
        }
    }
}

/// Convert a timeout in seconds, rejecting zero, negative, non-finite and
/// out-of-range values
pub fn timeout_from_secs(secs: f64) -> Result<Duration, WatchError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(WatchError::InvalidTimeout(format!(
            "timeout must be a positive number of seconds, got {}",
            secs
        )));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| WatchError::InvalidTimeout(format!("timeout of {} seconds: {}", secs, e)))
}

/// Watches the provider for the deploy of one pull request
pub struct DeploymentWatcher<S, C> {
    source: S,
    clock: C,
    options: Options,
}

impl<S, C> DeploymentWatcher<S, C>
where
    S: BuildSource,
    C: Clock,
{
    /// Create a new watcher
    pub fn new(source: S, clock: C, options: Options) -> Self {
        Self {
            source,
            clock,
            options,
        }
    }

    /// Watch until a terminal outcome. `total_timeout` falls back to the
    /// configured default when `None`.
    pub async fn watch(
        &self,
        key: Option<CorrelationKey>,
        total_timeout: Option<Duration>,
    ) -> Result<PollOutcome, WatchError> {
        self.watch_until(key, total_timeout, Box::pin(futures::future::pending::<()>()))
            .await
    }

    /// Same as [`watch`](Self::watch), but the sleep between polls is
    /// interrupted when `shutdown_signal` resolves.
    pub async fn watch_until(
        &self,
        key: Option<CorrelationKey>,
        total_timeout: Option<Duration>,
        mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
    ) -> Result<PollOutcome, WatchError> {
        let key = key.ok_or_else(|| {
            WatchError::InvalidCorrelationKey("no pull request number was supplied".to_string())
        })?;
        let budget = total_timeout.unwrap_or(self.options.total_timeout);
        if budget.is_zero() {
            return Err(WatchError::InvalidTimeout(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if self.options.poll_interval.is_zero() {
            return Err(WatchError::ConfigError(
                "poll interval must be greater than zero".to_string(),
            ));
        }

        info!(
            "Watching for the deploy of {} (timeout {:?})",
            key.source_ref(),
            budget
        );

        let start = self.clock.now();
        let mut fsm = WatchFsm::new();

        loop {
            let event = self.poll_once(&key).await?;
            fsm.process(event)?;

            let elapsed = self.clock.now().saturating_duration_since(start);
            if let Some(outcome) = fsm.outcome(elapsed) {
                return Ok(outcome);
            }

            let deadline = self.deadline(budget, fsm.build_seen());
            if elapsed >= deadline {
                fsm.process(WatchEvent::DeadlineReached)?;
                info!(
                    "Gave up on {} after {:?} ({} polls)",
                    key.source_ref(),
                    elapsed,
                    fsm.iterations()
                );
                return fsm
                    .outcome(elapsed)
                    .ok_or_else(|| WatchError::Internal("timed out without an outcome".to_string()));
            }

            // Never sleep past the deadline
            let pause = self.options.poll_interval.min(deadline - elapsed);
            debug!("No terminal state yet, next poll in {:?}", pause);

            tokio::select! {
                biased;
                _ = &mut shutdown_signal => {
                    info!("Watch cancelled after {:?}", elapsed);
                    return Err(WatchError::Cancelled(elapsed));
                }
                _ = self.clock.sleep(pause) => {}
            }
        }
    }

    /// Discovery budget applies only until a build is found
    fn deadline(&self, budget: Duration, build_seen: bool) -> Duration {
        match self.options.discovery_timeout {
            Some(discovery) if !build_seen => discovery.min(budget),
            _ => budget,
        }
    }

    /// One fetch-and-match cycle
    async fn poll_once(&self, key: &CorrelationKey) -> Result<WatchEvent, WatchError> {
        let builds = match self.source.list_builds().await {
            Ok(builds) => builds,
            Err(e) => return self.on_provider_error(e, WatchEvent::NoBuild),
        };

        let Some(build) = builds.into_iter().find(|b| key.matches(&b.source_ref)) else {
            debug!("No build found for {} yet", key.source_ref());
            return Ok(WatchEvent::NoBuild);
        };

        info!(
            "Checking build {} with deploy_id {} and sha {}",
            build.id, build.deploy_id, build.source_ref
        );

        if let Some(err) = build.error_message {
            return Ok(WatchEvent::DeployFailed(err));
        }
        if build.deploy_id.is_empty() {
            debug!("Build {} has no deploy yet", build.id);
            return Ok(WatchEvent::InProgress(None));
        }

        let deploy = match self.source.get_deploy(&build.deploy_id).await {
            Ok(deploy) => deploy,
            Err(e) => return self.on_provider_error(e, WatchEvent::InProgress(None)),
        };

        let event = match deploy.state {
            DeployState::Ready => match deploy.permalink {
                Some(permalink) => WatchEvent::DeployReady(permalink),
                None => {
                    WatchEvent::DeployFailed(format!("deploy {} is ready but has no URL", deploy.id))
                }
            },
            DeployState::Error => WatchEvent::DeployFailed(
                deploy
                    .error_message
                    .unwrap_or_else(|| format!("deploy {} entered the error state", deploy.id)),
            ),
            state => {
                debug!("Deploy {} is {:?}", deploy.id, state);
                WatchEvent::InProgress(Some(state))
            }
        };
        Ok(event)
    }

    fn on_provider_error(
        &self,
        err: WatchError,
        fallback: WatchEvent,
    ) -> Result<WatchEvent, WatchError> {
        match self.options.provider_errors {
            ProviderErrorPolicy::FailFast => Err(err),
            ProviderErrorPolicy::Retry if err.is_provider_error() => {
                warn!("Provider request failed, retrying next cycle: {}", err);
                Ok(fallback)
            }
            ProviderErrorPolicy::Retry => Err(err),
        }
    }
}
