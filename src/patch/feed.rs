use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::models::{PatchInfo, PatchManifest};
use crate::stats::StatsError;

/// Source of the patch the current meta is based on
#[async_trait]
pub trait PatchFeed: Send + Sync {
    async fn current_patch(&self) -> Result<PatchInfo, StatsError>;
}

/// Reads the patch manifest over HTTP
pub struct HttpPatchFeed {
    client: Client,
    url: String,
}

impl HttpPatchFeed {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, StatsError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StatsError::PatchFeed(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl PatchFeed for HttpPatchFeed {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn current_patch(&self) -> Result<PatchInfo, StatsError> {
        debug!("Fetching patch manifest");

        let response = self.client.get(&self.url).send().await.map_err(|e| {
            warn!(error = %e, "Failed to fetch patch manifest");
            StatsError::PatchFeed(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Patch manifest request rejected");
            return Err(StatsError::PatchFeed(format!("HTTP {}", status)));
        }

        let manifest: PatchManifest = response.json().await.map_err(|e| {
            warn!(error = %e, "Failed to parse patch manifest");
            StatsError::PatchFeed(e.to_string())
        })?;

        let patch = manifest.current_patch()?.clone();
        info!(patch_number = patch.number, patch_date = %patch.date, "Retrieved current patch");
        Ok(patch)
    }
}

/// Patch feed that serves a fixed manifest, for development and testing
pub struct StaticPatchFeed {
    manifest: PatchManifest,
}

impl StaticPatchFeed {
    pub fn new(manifest: PatchManifest) -> Self {
        Self { manifest }
    }

    /// Feed whose only patch is the current one
    pub fn single(patch: PatchInfo) -> Self {
        Self::new(PatchManifest {
            current_meta_patch: patch.number,
            patches: vec![patch],
        })
    }
}

#[async_trait]
impl PatchFeed for StaticPatchFeed {
    async fn current_patch(&self) -> Result<PatchInfo, StatsError> {
        self.manifest.current_patch().cloned()
    }
}
