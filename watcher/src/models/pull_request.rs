//! Pull request correlation key

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::WatchError;

/// Pull request number used to find the matching build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct CorrelationKey(u64);

impl CorrelationKey {
    /// Create a key from a pull request number
    pub fn new(number: u64) -> Result<Self, WatchError> {
        if number == 0 {
            return Err(WatchError::InvalidCorrelationKey(
                "pull request number must be positive".to_string(),
            ));
        }
        Ok(Self(number))
    }

    /// The pull request number
    pub fn number(&self) -> u64 {
        self.0
    }

    /// Reference string the provider attaches to builds of this pull request
    pub fn source_ref(&self) -> String {
        format!("pull/{}/head", self.0)
    }

    /// Exact match against a build's reference
    pub fn matches(&self, source_ref: &str) -> bool {
        source_ref == self.source_ref()
    }
}

impl TryFrom<u64> for CorrelationKey {
    type Error = WatchError;

    fn try_from(number: u64) -> Result<Self, Self::Error> {
        Self::new(number)
    }
}

impl From<CorrelationKey> for u64 {
    fn from(key: CorrelationKey) -> Self {
        key.0
    }
}

impl FromStr for CorrelationKey {
    type Err = WatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(WatchError::InvalidCorrelationKey(
                "pull request number is empty".to_string(),
            ));
        }
        let number = trimmed
            .parse::<u64>()
            .map_err(|e| WatchError::InvalidCorrelationKey(format!("{:?}: {}", s, e)))?;
        Self::new(number)
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
