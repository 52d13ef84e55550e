//! Terminal result of a watch

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How a watch ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PollOutcome {
    /// The deploy is live at `permalink`
    Ready { permalink: String },

    /// The build or deploy failed on the provider side
    Failed { reason: String },

    /// The budget ran out before a terminal state was observed
    TimedOut {
        /// Whether a build for the pull request was ever found
        build_seen: bool,
        /// Time spent polling
        waited: Duration,
    },
}

impl PollOutcome {
    pub fn permalink(&self) -> Option<&str> {
        match self {
            PollOutcome::Ready { permalink } => Some(permalink),
            _ => None,
        }
    }
}
