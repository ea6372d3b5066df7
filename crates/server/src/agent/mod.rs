//! The offline cache agent.
//!
//! Three handlers make up the whole agent:
//!
//! - [`Agent::install`] pre-caches the asset manifest into the bucket named
//!   by the version identifier.
//! - [`Agent::activate`] deletes every other bucket and claims open pages.
//! - [`Agent::handle_fetch`] serves GET requests cache-first, falling back
//!   to the network and storing 200 responses in the background.
//!
//! Storage and network access are injected as [`CacheStorage`] and
//! [`Fetcher`] trait objects. Each handler is an `async fn`; the host keeps
//! the event alive by awaiting the returned future.

pub mod activate;
pub mod fetch;
pub mod install;
pub mod lifecycle;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use offline_core::{AgentConfig, CacheStorage, Error, Fetcher};
use tokio::sync::Mutex;

pub use fetch::FetchOutcome;
pub use lifecycle::{Lifecycle, WorkerState};

pub struct Agent {
    config: AgentConfig,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    lifecycle: Mutex<Lifecycle>,
}

impl Agent {
    pub fn new(config: AgentConfig, storage: Arc<dyn CacheStorage>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { config, storage, fetcher, lifecycle: Mutex::new(Lifecycle::default()) }
    }

    /// Name of the current bucket.
    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub async fn lifecycle(&self) -> Lifecycle {
        *self.lifecycle.lock().await
    }

    async fn transition(&self, to: WorkerState) -> Result<(), Error> {
        self.lifecycle.lock().await.transition(to)
    }

    /// Mark this version redundant after a failed lifecycle step.
    async fn fail(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        if let Err(e) = lifecycle.transition(WorkerState::Redundant) {
            tracing::warn!(error = %e, "could not mark worker redundant");
        }
    }
}
