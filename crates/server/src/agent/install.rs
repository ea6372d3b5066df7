//! Install handler: pre-cache the asset manifest.
//!
//! Every asset is fetched and stored in its own task. A failing asset is
//! logged and left out of the bucket; only failing to open the bucket
//! fails the install.

use std::collections::HashMap;
use std::sync::Arc;

use offline_core::{CacheStorage, Error, Fetcher, Request};
use schemars::JsonSchema;
use serde::Serialize;
use tokio::task::JoinSet;
use url::Url;

use super::{Agent, WorkerState};

/// An asset that did not make it into the bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct AssetFailure {
    pub url: String,
    pub reason: String,
}

/// Result of a completed install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct InstallReport {
    pub bucket: String,
    /// Stored assets, in manifest order.
    pub cached: Vec<String>,
    /// Skipped assets, in manifest order.
    pub failed: Vec<AssetFailure>,
    pub skip_waiting: bool,
}

async fn cache_asset(
    storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>, bucket: String, url: Url,
) -> Result<(), Error> {
    let request = Request::get(url.as_str());
    let response = fetcher.fetch(&request).await?;

    if !response.ok() {
        tracing::warn!(url = %url, status = response.status, "failed to fetch asset");
        return Err(Error::HttpError(format!("status {}", response.status)));
    }

    storage.put(&bucket, &request, response).await
}

impl Agent {
    /// Handle the install event.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_STATE` if this version was already installed, or the
    /// storage error if the bucket cannot be opened. A failed install leaves
    /// the worker redundant.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        tracing::info!(version = %self.version(), "install event");
        self.transition(WorkerState::Installing).await?;

        match self.precache().await {
            Ok(mut report) => {
                let mut lifecycle = self.lifecycle.lock().await;
                lifecycle.transition(WorkerState::Installed)?;
                lifecycle.skip_waiting();
                report.skip_waiting = lifecycle.skip_waiting;
                Ok(report)
            }
            Err(e) => {
                tracing::error!(version = %self.version(), error = %e, "installation failed");
                self.fail().await;
                Err(e)
            }
        }
    }

    async fn precache(&self) -> Result<InstallReport, Error> {
        let bucket = self.version().to_string();
        self.storage.open(&bucket).await?;
        tracing::info!(bucket = %bucket, assets = self.config.manifest.len(), "caching static assets");

        let mut outcomes: Vec<Option<Result<String, AssetFailure>>> = vec![None; self.config.manifest.len()];
        let mut join_set = JoinSet::new();
        let mut in_flight = HashMap::new();

        for (index, (entry, resolved)) in self.config.manifest.resolve(&self.config.scope).into_iter().enumerate() {
            let url = match resolved {
                Ok(url) => url,
                Err(e) => {
                    tracing::error!(entry = %entry, error = %e, "error caching asset");
                    outcomes[index] = Some(Err(AssetFailure { url: entry, reason: e.to_string() }));
                    continue;
                }
            };

            let storage = self.storage.clone();
            let fetcher = self.fetcher.clone();
            let bucket = bucket.clone();
            let task_url = url.clone();
            let handle = join_set.spawn(async move { cache_asset(storage, fetcher, bucket, task_url).await });
            in_flight.insert(handle.id(), (index, url));
        }

        while let Some(joined) = join_set.join_next_with_id().await {
            let (id, result) = match joined {
                Ok((id, result)) => (id, result),
                Err(e) => (e.id(), Err(Error::StorageTask(e.to_string()))),
            };
            let Some((index, url)) = in_flight.remove(&id) else {
                continue;
            };

            outcomes[index] = Some(match result {
                Ok(()) => Ok(url.to_string()),
                Err(e) => {
                    tracing::error!(url = %url, error = %e, "error caching asset");
                    Err(AssetFailure { url: url.to_string(), reason: e.to_string() })
                }
            });
        }

        let mut report = InstallReport { bucket, cached: Vec::new(), failed: Vec::new(), skip_waiting: false };
        for outcome in outcomes.into_iter().flatten() {
            match outcome {
                Ok(url) => report.cached.push(url),
                Err(failure) => report.failed.push(failure),
            }
        }

        tracing::info!(
            bucket = %report.bucket,
            cached = report.cached.len(),
            failed = report.failed.len(),
            "static assets cached"
        );

        Ok(report)
    }
}
