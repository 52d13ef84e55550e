//! Finite State Machine for a single watch

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::WatchError;
use crate::models::{DeployState, PollOutcome};

/// Watch state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchState {
    /// Initial state, still querying the provider
    Polling,

    /// Deploy is live
    Ready,

    /// Build or deploy failed
    Failed,

    /// Budget exhausted
    TimedOut,
}

impl WatchState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WatchState::Polling)
    }
}

/// Observation fed into the FSM, one per poll iteration plus the deadline
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// No build matched the pull request this cycle
    NoBuild,

    /// A matching build exists but its deploy is not terminal.
    /// `None` when the deploy could not be read this cycle.
    InProgress(Option<DeployState>),

    /// Deploy reached the ready state at the given URL
    DeployReady(String),

    /// Build or deploy reported an error
    DeployFailed(String),

    /// Elapsed time reached the budget
    DeadlineReached,
}

/// Watch FSM
#[derive(Debug, Clone)]
pub struct WatchFsm {
    state: WatchState,
    permalink: Option<String>,
    error: Option<String>,
    build_seen: bool,
    iterations: u32,
}

impl WatchFsm {
    /// Create a new FSM in polling state
    pub fn new() -> Self {
        Self {
            state: WatchState::Polling,
            permalink: None,
            error: None,
            build_seen: false,
            iterations: 0,
        }
    }

    /// Get current state
    pub fn state(&self) -> &WatchState {
        &self.state
    }

    /// Get error message if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether a build for the pull request has been observed
    pub fn build_seen(&self) -> bool {
        self.build_seen
    }

    /// Number of poll observations processed
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: WatchEvent) -> Result<(), WatchError> {
        let new_state = match (&self.state, event) {
            (WatchState::Polling, WatchEvent::NoBuild) => {
                self.iterations += 1;
                WatchState::Polling
            }
            (WatchState::Polling, WatchEvent::InProgress(_)) => {
                self.iterations += 1;
                self.build_seen = true;
                WatchState::Polling
            }
            (WatchState::Polling, WatchEvent::DeployReady(permalink)) => {
                self.iterations += 1;
                self.build_seen = true;
                self.permalink = Some(permalink);
                WatchState::Ready
            }
            (WatchState::Polling, WatchEvent::DeployFailed(err)) => {
                self.iterations += 1;
                self.build_seen = true;
                self.error = Some(err);
                WatchState::Failed
            }
            (WatchState::Polling, WatchEvent::DeadlineReached) => WatchState::TimedOut,

            // Terminal states accept nothing
            (state, event) => {
                return Err(WatchError::InvalidTransition(format!(
                    "{:?} -> {:?}",
                    state, event
                )));
            }
        };

        self.state = new_state;
        Ok(())
    }

    /// Build the outcome once a terminal state is reached
    pub fn outcome(&self, waited: Duration) -> Option<PollOutcome> {
        match self.state {
            WatchState::Polling => None,
            WatchState::Ready => Some(PollOutcome::Ready {
                permalink: self.permalink.clone().unwrap_or_default(),
            }),
            WatchState::Failed => Some(PollOutcome::Failed {
                reason: self.error.clone().unwrap_or_default(),
            }),
            WatchState::TimedOut => Some(PollOutcome::TimedOut {
                build_seen: self.build_seen,
                waited,
            }),
        }
    }
}

impl Default for WatchFsm {
    fn default() -> Self {
        Self::new()
    }
}
