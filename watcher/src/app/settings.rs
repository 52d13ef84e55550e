//! Action settings
//!
//! Settings are layered: an optional JSON file, then the `INPUT_*` variables
//! GitHub sets for action inputs, then `--key=value` command-line arguments.
//! Later layers win. Empty values count as unset, since GitHub exports every
//! declared input even when the workflow leaves it blank.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

use crate::app::options::AppOptions;
use crate::errors::WatchError;
use crate::http::client::{DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
use crate::logs::{LogLevel, LogOptions};
use crate::watch::watcher::{self, timeout_from_secs, ProviderErrorPolicy};

/// Raw action settings
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Netlify personal access token
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub netlify_secret: Option<SecretString>,

    /// Netlify site ID
    #[serde(default)]
    pub site_id: Option<String>,

    /// Total budget in seconds
    #[serde(default = "default_max_timeout")]
    pub max_timeout: f64,

    /// Budget for finding the build, in seconds. Half of `max_timeout` when unset.
    #[serde(default)]
    pub discovery_timeout: Option<f64>,

    /// Seconds between polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval: f64,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: f64,

    /// Abort on the first provider error instead of retrying next cycle
    #[serde(default)]
    pub fail_on_provider_error: bool,

    /// Netlify API root
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit JSON logs
    #[serde(default)]
    pub log_json: bool,

    /// Pull request number, overriding the event payload
    #[serde(default)]
    pub pull_request: Option<u64>,

    /// Path of the workflow event payload (`GITHUB_EVENT_PATH`)
    #[serde(default)]
    pub event_path: Option<PathBuf>,

    /// Path of the step output file (`GITHUB_OUTPUT`)
    #[serde(default)]
    pub output_file: Option<PathBuf>,
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()).map(SecretString::from))
}

fn default_max_timeout() -> f64 {
    watcher::DEFAULT_TIMEOUT.as_secs_f64()
}

fn default_poll_interval() -> f64 {
    watcher::DEFAULT_POLL_INTERVAL.as_secs_f64()
}

fn default_request_timeout() -> f64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs_f64()
}

fn default_api_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            netlify_secret: None,
            site_id: None,
            max_timeout: default_max_timeout(),
            discovery_timeout: None,
            poll_interval: default_poll_interval(),
            request_timeout: default_request_timeout(),
            fail_on_provider_error: false,
            api_base_url: default_api_base_url(),
            log_level: LogLevel::Info,
            log_json: false,
            pull_request: None,
            event_path: None,
            output_file: None,
        }
    }
}

impl Settings {
    /// Read settings from a JSON file
    pub async fn read_json(path: &Path) -> Result<Self, WatchError> {
        let raw = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Overlay the GitHub Actions environment
    pub fn apply_env<I>(&mut self, vars: I) -> Result<(), WatchError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            if let Some(input) = name.strip_prefix("INPUT_") {
                self.apply(&input.to_lowercase(), &value)?;
            } else {
                match name.as_str() {
                    "GITHUB_EVENT_PATH" => self.apply("event_path", &value)?,
                    "GITHUB_OUTPUT" => self.apply("output_file", &value)?,
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Overlay `--key=value` arguments
    pub fn apply_args(&mut self, args: &HashMap<String, String>) -> Result<(), WatchError> {
        for (key, value) in args {
            self.apply(&key.replace('-', "_"), value)?;
        }
        Ok(())
    }

    /// Set one setting by name. Unknown names are ignored.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), WatchError> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(());
        }

        match key {
            "netlify_secret" => self.netlify_secret = Some(SecretString::from(value.to_string())),
            "site_id" => self.site_id = Some(value.to_string()),
            "max_timeout" => self.max_timeout = parse_number(key, value)?,
            "discovery_timeout" => self.discovery_timeout = Some(parse_number(key, value)?),
            "poll_interval" => self.poll_interval = parse_number(key, value)?,
            "request_timeout" => self.request_timeout = parse_number(key, value)?,
            "fail_on_provider_error" => self.fail_on_provider_error = parse_bool(key, value)?,
            "api_base_url" => self.api_base_url = value.to_string(),
            "log_level" => {
                self.log_level = value.parse().map_err(WatchError::ConfigError)?;
            }
            "log_json" => self.log_json = parse_bool(key, value)?,
            "pull_request" => {
                self.pull_request = Some(value.parse().map_err(|_| {
                    WatchError::InvalidCorrelationKey(format!("{:?} is not a number", value))
                })?);
            }
            "event_path" => self.event_path = Some(PathBuf::from(value)),
            "output_file" => self.output_file = Some(PathBuf::from(value)),
            _ => {}
        }
        Ok(())
    }

    /// Validate and convert into application options
    pub fn into_options(self) -> Result<AppOptions, WatchError> {
        let token = self
            .netlify_secret
            .ok_or_else(|| WatchError::ConfigError("netlify_secret is required".to_string()))?;
        let site_id = self
            .site_id
            .ok_or_else(|| WatchError::ConfigError("site_id is required".to_string()))?;

        let total_timeout = timeout_from_secs(self.max_timeout)?;
        let discovery_timeout = match self.discovery_timeout {
            Some(secs) => timeout_from_secs(secs)?,
            None => total_timeout / 2,
        };
        let poll_interval = positive_secs("poll_interval", self.poll_interval)?;
        let request_timeout = positive_secs("request_timeout", self.request_timeout)?;

        Ok(AppOptions {
            api_base_url: self.api_base_url,
            site_id,
            token,
            request_timeout,
            watcher: watcher::Options {
                poll_interval,
                total_timeout,
                discovery_timeout: Some(discovery_timeout),
                provider_errors: if self.fail_on_provider_error {
                    ProviderErrorPolicy::FailFast
                } else {
                    ProviderErrorPolicy::Retry
                },
            },
            log: LogOptions {
                log_level: self.log_level,
                json_format: self.log_json,
            },
        })
    }
}

fn parse_number(key: &str, value: &str) -> Result<f64, WatchError> {
    value
        .parse::<f64>()
        .map_err(|_| WatchError::ConfigError(format!("{} must be a number, got {:?}", key, value)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, WatchError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(WatchError::ConfigError(format!(
            "{} must be true or false, got {:?}",
            key, value
        ))),
    }
}

fn positive_secs(key: &str, secs: f64) -> Result<Duration, WatchError> {
    timeout_from_secs(secs).map_err(|_| {
        WatchError::ConfigError(format!("{} must be a positive number, got {}", key, secs))
    })
}
