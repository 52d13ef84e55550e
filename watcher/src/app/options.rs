//! Application configuration options

use std::time::Duration;

use secrecy::SecretString;

use crate::logs::LogOptions;
use crate::watch::watcher;

/// Main application options
#[derive(Debug)]
pub struct AppOptions {
    /// Netlify API root
    pub api_base_url: String,

    /// Netlify site ID
    pub site_id: String,

    /// Netlify access token
    pub token: SecretString,

    /// Per-request HTTP timeout
    pub request_timeout: Duration,

    /// Watcher options
    pub watcher: watcher::Options,

    /// Logging options
    pub log: LogOptions,
}
