//! sw_fetch tool implementation.
//!
//! Dispatches a page request through the agent's fetch handler. Requests the
//! agent passes through are performed directly against the network, the way
//! a browser does when no handler responds.

use offline_core::{Fetcher, Method, Request, RequestMode, Response};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::lifecycle::json_result;
use crate::agent::{Agent, FetchOutcome};
use crate::error::HostError;

/// Input parameters for the sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL requested by the page.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Request mode (default: cors).
    #[serde(default)]
    pub mode: Option<RequestMode>,
}

/// What the page receives.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    /// passthrough, cache, network, stored or no_response
    pub outcome: String,
    pub status: Option<u16>,
    pub content_type: Option<String>,
    /// Body decoded as lossy UTF-8.
    pub body: Option<String>,
    pub body_bytes: Option<usize>,
    /// Set when the agent produced no response.
    pub error: Option<String>,
}

impl SwFetchOutput {
    fn from_response(outcome: &str, mut response: Response) -> Result<Self, McpError> {
        let content_type = response.content_type().map(str::to_string);
        let body = response.bytes()?;
        Ok(Self {
            outcome: outcome.to_string(),
            status: Some(response.status),
            content_type,
            body: Some(String::from_utf8_lossy(&body).into_owned()),
            body_bytes: Some(body.len()),
            error: None,
        })
    }
}

fn parse_request(params: SwFetchParams) -> Result<Request, HostError> {
    let method = match params.method.as_deref() {
        Some(m) => m.parse::<Method>().map_err(|_| HostError::InvalidInput(format!("invalid method: {m:?}")))?,
        None => Method::Get,
    };
    if params.url.trim().is_empty() {
        return Err(HostError::InvalidInput("url must not be empty".into()));
    }
    Ok(Request::new(method, params.url).with_mode(params.mode.unwrap_or_default()))
}

pub async fn fetch_impl(agent: &Agent, network: &dyn Fetcher, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let request = parse_request(params)?;

    let outcome = agent.handle_fetch(request.clone()).await;
    let label = outcome.label();
    tracing::info!(url = %request.url, method = %request.method, outcome = label, "fetch event");

    let output = match outcome {
        FetchOutcome::Passthrough => {
            let response = network.fetch(&request).await?;
            SwFetchOutput::from_response(label, response)?
        }
        FetchOutcome::NoResponse(e) => SwFetchOutput {
            outcome: label.to_string(),
            status: None,
            content_type: None,
            body: None,
            body_bytes: None,
            error: Some(e.to_string()),
        },
        // The store task keeps running after the response is handed back.
        FetchOutcome::Stored { response, store: _ } => SwFetchOutput::from_response(label, response)?,
        FetchOutcome::FromCache(response) | FetchOutcome::Uncached(response) => {
            SwFetchOutput::from_response(label, response)?
        }
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{FakeFetcher, activated_agent, installed_agent};
    use offline_core::CacheDb;
    use std::sync::Arc;

    const PAGE: &str = "http://localhost:8080/index.html";

    fn output(result: &CallToolResult) -> SwFetchOutput {
        let text = &result.content.first().and_then(|c| c.as_text()).expect("Expected text content").text;
        serde_json::from_str(text).unwrap()
    }

    fn params(url: &str, method: Option<&str>) -> SwFetchParams {
        SwFetchParams { url: url.to_string(), method: method.map(str::to_string), mode: None }
    }

    #[tokio::test]
    async fn test_fetch_served_from_cache() {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let fetcher = Arc::new(FakeFetcher::new());
        let agent = activated_agent("v1", db.clone(), fetcher.clone()).await;
        db.put_entry("v1", &Request::get(PAGE), Response::new(PAGE, 200, "cached").with_header("Content-Type", "text/html"))
            .await
            .unwrap();

        let out = output(&fetch_impl(&agent, fetcher.as_ref(), params(PAGE, None)).await.unwrap());

        assert_eq!(out.outcome, "cache");
        assert_eq!(out.status, Some(200));
        assert_eq!(out.content_type.as_deref(), Some("text/html"));
        assert_eq!(out.body.as_deref(), Some("cached"));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_fetch_not_found_reports_network() {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let fetcher = Arc::new(FakeFetcher::new().status(PAGE, 404, "nope"));
        let agent = activated_agent("v1", db, fetcher.clone()).await;

        let out = output(&fetch_impl(&agent, fetcher.as_ref(), params(PAGE, None)).await.unwrap());

        assert_eq!(out.outcome, "network");
        assert_eq!(out.status, Some(404));
    }

    #[tokio::test]
    async fn test_fetch_offline_reports_no_response() {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let fetcher = Arc::new(FakeFetcher::new());
        let agent = activated_agent("v1", db, fetcher.clone()).await;

        let out = output(&fetch_impl(&agent, fetcher.as_ref(), params(PAGE, None)).await.unwrap());

        assert_eq!(out.outcome, "no_response");
        assert!(out.status.is_none());
        assert!(out.error.unwrap().starts_with("NETWORK_ERROR"));
    }

    #[tokio::test]
    async fn test_post_goes_straight_to_network() {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let fetcher = Arc::new(FakeFetcher::new().ok(PAGE, "posted"));
        let agent = activated_agent("v1", db.clone(), fetcher.clone()).await;

        let out = output(&fetch_impl(&agent, fetcher.as_ref(), params(PAGE, Some("post"))).await.unwrap());

        assert_eq!(out.outcome, "passthrough");
        assert_eq!(out.body.as_deref(), Some("posted"));
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(db.entry_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_before_activation_goes_straight_to_network() {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let fetcher = Arc::new(FakeFetcher::new().ok(PAGE, "live"));
        let agent = installed_agent("v1", db.clone(), fetcher.clone()).await;

        let out = output(&fetch_impl(&agent, fetcher.as_ref(), params(PAGE, None)).await.unwrap());

        assert_eq!(out.outcome, "passthrough");
        assert_eq!(db.entry_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_method_rejected() {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let fetcher = Arc::new(FakeFetcher::new());
        let agent = activated_agent("v1", db, fetcher.clone()).await;

        let err = fetch_impl(&agent, fetcher.as_ref(), params(PAGE, Some(""))).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }
}
