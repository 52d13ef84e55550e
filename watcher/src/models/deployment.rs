//! Build and deploy models

use chrono::{DateTime, Utc};
use netlify_api::models::{Deploy, SiteBuild};
use serde::{Deserialize, Serialize};

/// A build known to the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    /// Provider build ID
    pub id: String,

    /// Reference the provider attached to the build, e.g. `pull/42/head`
    pub source_ref: String,

    /// ID of the deploy this build publishes to
    pub deploy_id: String,

    /// Whether the build has finished
    pub done: bool,

    /// Build-level error, set when the build itself failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// When the provider registered the build
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<SiteBuild> for BuildRecord {
    fn from(build: SiteBuild) -> Self {
        Self {
            id: build.id,
            source_ref: build.sha.unwrap_or_default(),
            deploy_id: build.deploy_id.unwrap_or_default(),
            done: build.done,
            // Netlify sends an empty string rather than null on some builds
            error_message: build.error.filter(|e| !e.trim().is_empty()),
            created_at: build.created_at,
        }
    }
}

/// Deploy state, collapsed from the provider's state names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployState {
    /// Queued, not yet building
    Pending,

    /// Build or upload in progress
    Building,

    /// Published and reachable
    Ready,

    /// Deploy failed
    Error,

    /// Any state the watcher does not know about
    Other(String),
}

impl DeployState {
    /// Whether polling must stop once this state is observed
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeployState::Ready | DeployState::Error)
    }
}

impl From<&str> for DeployState {
    fn from(state: &str) -> Self {
        match state {
            "new" | "pending_review" | "accepted" | "enqueued" => DeployState::Pending,
            "building" | "uploading" | "uploaded" | "preparing" | "prepared" | "processing"
            | "processed" | "retrying" => DeployState::Building,
            "ready" => DeployState::Ready,
            "error" => DeployState::Error,
            other => DeployState::Other(other.to_string()),
        }
    }
}

/// Deploy status for a matched build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployRecord {
    /// Provider deploy ID
    pub id: String,

    /// Current state
    pub state: DeployState,

    /// Public URL, present once ready
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permalink: Option<String>,

    /// Deploy-level error message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<Deploy> for DeployRecord {
    fn from(deploy: Deploy) -> Self {
        let permalink = deploy
            .links
            .permalink
            .or(deploy.ssl_url)
            .or(deploy.deploy_url)
            .filter(|url| !url.is_empty());

        Self {
            state: DeployState::from(deploy.state.as_str()),
            id: deploy.id,
            permalink,
            error_message: deploy.error_message.filter(|e| !e.trim().is_empty()),
        }
    }
}
