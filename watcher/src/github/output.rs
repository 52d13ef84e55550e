//! Workflow commands and step outputs

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::errors::WatchError;
use crate::models::{CorrelationKey, PollOutcome};
use crate::watch::Options;

/// Name of the step output carrying the deploy URL
pub const DEPLOY_URL_OUTPUT: &str = "deployUrl";

/// Message for a run that is not attached to a pull request
pub const MISSING_PULL_REQUEST: &str =
    "Action must be run in conjunction with the `pull_request` event";

/// Writes step outputs and workflow commands
pub struct Reporter<W: Write> {
    out: W,
    output_file: Option<PathBuf>,
}

impl<W: Write> Reporter<W> {
    /// `output_file` is the `GITHUB_OUTPUT` path; without it the legacy
    /// `::set-output` command is printed instead
    pub fn new(out: W, output_file: Option<PathBuf>) -> Self {
        Self { out, output_file }
    }

    /// Consume the reporter and return the command stream
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Publish a step output
    pub async fn set_output(&mut self, name: &str, value: &str) -> Result<(), WatchError> {
        match &self.output_file {
            Some(path) => {
                let entry = if value.contains('\n') {
                    format!("{name}<<DEPLOY_WATCH_EOF\n{value}\nDEPLOY_WATCH_EOF\n")
                } else {
                    format!("{name}={value}\n")
                };
                let mut file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await?;
                file.write_all(entry.as_bytes()).await?;
                file.flush().await?;
            }
            None => {
                writeln!(self.out, "::set-output name={}::{}", name, escape_data(value))?;
            }
        }
        Ok(())
    }

    /// Mark the step as failed
    pub fn set_failed(&mut self, message: &str) -> Result<(), WatchError> {
        writeln!(self.out, "::error::{}", escape_data(message))?;
        Ok(())
    }

    /// Turn an outcome into outputs and commands. Returns whether the step
    /// succeeded; a ready deploy whose URL cannot be published counts as a failure.
    pub async fn report(
        &mut self,
        outcome: &PollOutcome,
        key: CorrelationKey,
        options: &Options,
    ) -> Result<bool, WatchError> {
        let message = outcome_message(outcome, key, options);
        match outcome {
            PollOutcome::Ready { permalink } => {
                info!("{}", message);
                if let Err(e) = self.set_output(DEPLOY_URL_OUTPUT, permalink).await {
                    self.set_failed(&format!(
                        "Unable to publish the {} output: {}",
                        DEPLOY_URL_OUTPUT, e
                    ))?;
                    return Ok(false);
                }
                Ok(true)
            }
            PollOutcome::Failed { .. } | PollOutcome::TimedOut { .. } => {
                self.set_failed(&message)?;
                Ok(false)
            }
        }
    }
}

/// Human-readable line for an outcome. Timeouts quote the budget that
/// actually expired: the discovery budget when no build was ever found.
pub fn outcome_message(outcome: &PollOutcome, key: CorrelationKey, options: &Options) -> String {
    let total = options.total_timeout;
    let discovery = options.discovery_timeout.map_or(total, |d| d.min(total));
    match outcome {
        PollOutcome::Ready { permalink } => {
            format!("Build was successful and is available at {}", permalink)
        }
        PollOutcome::Failed { reason } => {
            format!(
                "Build failed with error \"{}\" for Pull Request {}",
                reason, key
            )
        }
        PollOutcome::TimedOut {
            build_seen: false, ..
        } => format!(
            "No build data found within the {} second timeout for Pull Request {}",
            format_secs(discovery),
            key
        ),
        PollOutcome::TimedOut {
            build_seen: true, ..
        } => format!(
            "Unable to find a successful deployment within the {} second timeout for Pull Request {}",
            format_secs(total),
            key
        ),
    }
}

fn format_secs(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs.fract() == 0.0 {
        format!("{}", secs as u64)
    } else {
        format!("{}", secs)
    }
}

/// Escape a workflow command payload
fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
