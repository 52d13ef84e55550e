//! HTTP client implementation

use std::time::Duration;

use netlify_api::models::ErrorResponse;
use reqwest::{header, Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, error};
use url::Url;

use crate::errors::WatchError;

/// Netlify REST API root
pub const DEFAULT_BASE_URL: &str = "https://api.netlify.com/api/v1/";

/// Per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the Netlify API, bound to one site
pub struct HttpClient {
    client: Client,
    base_url: Url,
    token: SecretString,
    site_id: String,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(
        base_url: &str,
        token: SecretString,
        site_id: &str,
        request_timeout: Duration,
    ) -> Result<Self, WatchError> {
        if site_id.trim().is_empty() {
            return Err(WatchError::ConfigError("site_id is empty".to_string()));
        }

        // Url::join drops the last path segment unless the base ends with a slash
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalized)
            .map_err(|e| WatchError::ConfigError(format!("invalid API URL {}: {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("deploy-watch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            token,
            site_id: site_id.trim().to_string(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the site ID
    pub fn site_id(&self) -> &str {
        &self.site_id
    }

    /// Resolve a path relative to the API root
    pub fn url(&self, path: &str) -> Result<Url, WatchError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| WatchError::ConfigError(format!("invalid API path {}: {}", path, e)))
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, WatchError> {
        let url = self.url(path)?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.token.expose_secret()),
            )
            .send()
            .await
            .map_err(|e| WatchError::ProviderUnavailable(format!("GET {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("HTTP GET failed: {} - {}", status, body);
            return Err(status_error(status, &url, &body));
        }

        response
            .json()
            .await
            .map_err(|e| WatchError::ProviderUnavailable(format!("GET {}: {}", url, e)))
    }
}

/// Map a non-success status to the error taxonomy
fn status_error(status: StatusCode, url: &Url, body: &str) -> WatchError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.trim().to_string());

    match status {
        StatusCode::NOT_FOUND => WatchError::NotFound(format!("{}: {}", url, message)),
        _ => WatchError::ProviderUnavailable(format!("{} {}: {}", status, url, message)),
    }
}
