//! API models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Entry of `GET /sites/{site_id}/builds`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteBuild {
    pub id: String,
    #[serde(default)]
    pub deploy_id: Option<String>,
    /// Netlify stores the git ref here for pull request builds, e.g. `pull/42/head`
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Links attached to a deploy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployLinks {
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
}

/// Response of `GET /deploys/{deploy_id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deploy {
    pub id: String,
    #[serde(default)]
    pub site_id: Option<String>,
    pub state: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub ssl_url: Option<String>,
    #[serde(default)]
    pub deploy_url: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub links: DeployLinks,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub review_id: Option<u64>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub code: Option<u16>,
    pub message: String,
}
