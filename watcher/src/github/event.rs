//! Workflow event payload

use std::path::Path;

use serde::Deserialize;

use crate::errors::WatchError;
use crate::models::CorrelationKey;

/// The parts of a `pull_request` event payload the watcher needs
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PullRequestEvent {
    /// Top-level pull request number
    #[serde(default)]
    pub number: Option<u64>,

    /// Nested pull request object, present on `pull_request_target` too
    #[serde(default)]
    pub pull_request: Option<PullRequestRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestRef {
    pub number: u64,
}

impl PullRequestEvent {
    /// Read the payload GitHub writes to `GITHUB_EVENT_PATH`
    pub async fn read(path: &Path) -> Result<Self, WatchError> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, WatchError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Correlation key of the pull request, if the event carries one
    pub fn correlation_key(&self) -> Option<CorrelationKey> {
        self.number
            .or_else(|| self.pull_request.as_ref().map(|pr| pr.number))
            .and_then(|n| CorrelationKey::new(n).ok())
    }
}
