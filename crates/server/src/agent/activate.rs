//! Activate handler: retire stale buckets and claim open pages.

use offline_core::Error;
use schemars::JsonSchema;
use serde::Serialize;
use tokio::task::JoinSet;

use super::{Agent, WorkerState};

/// Result of a completed activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ActivateReport {
    pub current: String,
    /// Buckets removed because their name differs from the current version.
    pub deleted: Vec<String>,
    pub clients_claimed: bool,
}

impl Agent {
    /// Handle the activate event.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_STATE` unless the worker is installed, or the first
    /// storage error hit while listing or deleting buckets. Deletions
    /// already in flight run to completion before the error is returned.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        tracing::info!(version = %self.version(), "activate event");
        self.transition(WorkerState::Activating).await?;

        let deleted = match self.retire_stale_buckets().await {
            Ok(deleted) => deleted,
            Err(e) => {
                tracing::error!(version = %self.version(), error = %e, "activation failed");
                self.fail().await;
                return Err(e);
            }
        };

        let mut lifecycle = self.lifecycle.lock().await;
        lifecycle.transition(WorkerState::Activated)?;
        lifecycle.claim_clients()?;

        Ok(ActivateReport { current: self.version().to_string(), deleted, clients_claimed: lifecycle.clients_claimed })
    }

    async fn retire_stale_buckets(&self) -> Result<Vec<String>, Error> {
        let names = self.storage.keys().await?;
        let mut join_set = JoinSet::new();

        for name in names.into_iter().filter(|name| name != self.version()) {
            tracing::info!(bucket = %name, "deleting old cache");
            let storage = self.storage.clone();
            join_set.spawn(async move {
                let result = storage.delete(&name).await;
                (name, result)
            });
        }

        let mut deleted = Vec::new();
        let mut first_error = None;

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((name, Ok(_))) => deleted.push(name),
                Ok((name, Err(e))) => {
                    tracing::error!(bucket = %name, error = %e, "failed to delete old cache");
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    tracing::error!(error = %e, "bucket deletion task failed");
                    first_error.get_or_insert(Error::StorageTask(e.to_string()));
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                deleted.sort();
                Ok(deleted)
            }
        }
    }
}
