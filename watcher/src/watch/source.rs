//! Build source seam

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::WatchError;
use crate::models::{BuildRecord, DeployRecord};

/// Read access to the provider's builds and deploys
#[async_trait]
pub trait BuildSource: Send + Sync {
    /// List every build the provider knows about for the site, unfiltered
    async fn list_builds(&self) -> Result<Vec<BuildRecord>, WatchError>;

    /// Get the deploy a build publishes to
    async fn get_deploy(&self, deploy_id: &str) -> Result<DeployRecord, WatchError>;
}

#[async_trait]
impl<T: BuildSource + ?Sized> BuildSource for Arc<T> {
    async fn list_builds(&self) -> Result<Vec<BuildRecord>, WatchError> {
        (**self).list_builds().await
    }

    async fn get_deploy(&self, deploy_id: &str) -> Result<DeployRecord, WatchError> {
        (**self).get_deploy(deploy_id).await
    }
}
