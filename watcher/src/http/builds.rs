//! Builds and deploys API client

use async_trait::async_trait;
use netlify_api::models::{Deploy, SiteBuild};
use tracing::debug;

use crate::errors::WatchError;
use crate::http::client::HttpClient;
use crate::models::{BuildRecord, DeployRecord};
use crate::watch::BuildSource;

impl HttpClient {
    /// List every build of the site. The API has no filter by ref.
    pub async fn list_site_builds(&self) -> Result<Vec<SiteBuild>, WatchError> {
        let path = format!("sites/{}/builds", self.site_id());
        let builds: Vec<SiteBuild> = self.get(&path).await?;
        debug!("Fetched {} builds for site {}", builds.len(), self.site_id());
        Ok(builds)
    }

    /// Get a deploy by ID
    pub async fn fetch_deploy(&self, deploy_id: &str) -> Result<Deploy, WatchError> {
        let path = format!("deploys/{}", deploy_id);
        self.get(&path).await
    }
}

#[async_trait]
impl BuildSource for HttpClient {
    async fn list_builds(&self) -> Result<Vec<BuildRecord>, WatchError> {
        let builds = self.list_site_builds().await?;
        Ok(builds.into_iter().map(BuildRecord::from).collect())
    }

    async fn get_deploy(&self, deploy_id: &str) -> Result<DeployRecord, WatchError> {
        let deploy = self.fetch_deploy(deploy_id).await?;
        Ok(DeployRecord::from(deploy))
    }
}
