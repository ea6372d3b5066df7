//! Fetch handler: cache-first, network fallback, store 200s in the background.
//!
//! ```text
//! Received -> Filtered-out                       => Passthrough
//!          -> Intercepted -> cache hit           => FromCache
//!                         -> miss -> net error   => NoResponse
//!                                 -> status!=200 => Uncached
//!                                 -> status==200 => Stored (put runs detached)
//! ```
//!
//! Cached entries never expire; only a version bump followed by activate
//! removes them. Any non-200 status is returned without being stored,
//! which also covers redirects and opaque responses.

use offline_core::{Error, Method, Request, Response};
use tokio::task::JoinHandle;

use super::Agent;

/// Terminal state of one intercepted request.
#[derive(Debug)]
pub enum FetchOutcome {
    /// Not handled; the host performs the request itself.
    Passthrough,
    FromCache(Response),
    /// Network response returned without storing it.
    Uncached(Response),
    /// 200 response returned; a copy is being written to the current bucket.
    Stored { response: Response, store: JoinHandle<()> },
    /// The network call failed and nothing was cached.
    NoResponse(Error),
}

impl FetchOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            FetchOutcome::Passthrough => "passthrough",
            FetchOutcome::FromCache(_) => "cache",
            FetchOutcome::Uncached(_) => "network",
            FetchOutcome::Stored { .. } => "stored",
            FetchOutcome::NoResponse(_) => "no_response",
        }
    }
}

impl Agent {
    /// Whether the request is one the agent handles at all.
    pub fn intercepts(&self, request: &Request) -> bool {
        if request.method != Method::Get {
            return false;
        }
        match request.scheme() {
            Some(scheme) => !self.config.is_ignored_scheme(scheme),
            None => true,
        }
    }

    /// Handle a fetch event from a controlled page.
    pub async fn handle_fetch(&self, request: Request) -> FetchOutcome {
        if !self.intercepts(&request) {
            return FetchOutcome::Passthrough;
        }
        if !self.lifecycle.lock().await.controls_clients() {
            tracing::debug!(url = %request.url, "not controlling clients yet");
            return FetchOutcome::Passthrough;
        }

        let request = normalize(request);

        match self.storage.match_request(&request).await {
            Ok(Some(cached)) => {
                tracing::debug!(url = %request.url, "serving from cache");
                return FetchOutcome::FromCache(cached);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(url = %request.url, error = %e, "cache lookup failed"),
        }

        tracing::debug!(url = %request.url, "fetching from network");
        let response = match self.fetcher.fetch(&request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(url = %request.url, error = %e, "fetch failed");
                return FetchOutcome::NoResponse(e);
            }
        };

        if response.status != 200 {
            tracing::info!(
                url = %request.url,
                status = response.status,
                kind = response.kind.as_str(),
                "not caching response"
            );
            return FetchOutcome::Uncached(response);
        }

        let copy = match response.try_clone() {
            Ok(copy) => copy,
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "cannot duplicate response");
                return FetchOutcome::Uncached(response);
            }
        };

        let storage = self.storage.clone();
        let bucket = self.version().to_string();
        let store = tokio::spawn(async move {
            tracing::debug!(url = %request.url, bucket = %bucket, "caching new response");
            if let Err(e) = storage.put(&bucket, &request, copy).await {
                tracing::warn!(url = %request.url, bucket = %bucket, error = %e, "failed to cache response");
            }
        });

        FetchOutcome::Stored { response, store }
    }
}

/// Bring the URL into the same serialized form install stores under,
/// so `https://cdn.example.com` and `https://cdn.example.com/` match.
fn normalize(mut request: Request) -> Request {
    if let Ok(mut url) = url::Url::parse(&request.url) {
        url.set_fragment(None);
        request.url = url.into();
    }
    request
}
