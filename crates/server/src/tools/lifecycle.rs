//! sw_install, sw_activate and sw_state tool implementations.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::agent::Agent;
use crate::error::HostError;

pub(crate) fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value).map_err(HostError::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Run the install handler and report what was pre-cached.
pub async fn install_impl(agent: &Agent) -> Result<CallToolResult, McpError> {
    let report = agent.install().await?;
    json_result(&report)
}

/// Run the activate handler and report which buckets were deleted.
pub async fn activate_impl(agent: &Agent) -> Result<CallToolResult, McpError> {
    let report = agent.activate().await?;
    json_result(&report)
}

pub async fn state_impl(agent: &Agent) -> Result<CallToolResult, McpError> {
    json_result(&agent.lifecycle().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{FakeFetcher, agent_with};
    use offline_core::{AssetManifest, CacheDb};
    use std::sync::Arc;

    fn text(result: &CallToolResult) -> String {
        result.content.first().and_then(|c| c.as_text()).expect("Expected text content").text.clone()
    }

    #[tokio::test]
    async fn test_install_then_activate() {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        db.open_bucket("old").await.unwrap();
        let fetcher = Arc::new(FakeFetcher::new().ok("http://localhost:8080/index.html", "index"));
        let agent = agent_with("v1", AssetManifest::new(vec!["./index.html".to_string()]), db.clone(), fetcher);

        let installed: serde_json::Value = serde_json::from_str(&text(&install_impl(&agent).await.unwrap())).unwrap();
        assert_eq!(installed["bucket"], "v1");
        assert_eq!(installed["cached"][0], "http://localhost:8080/index.html");

        let activated: serde_json::Value = serde_json::from_str(&text(&activate_impl(&agent).await.unwrap())).unwrap();
        assert_eq!(activated["deleted"][0], "old");
        assert_eq!(activated["clients_claimed"], true);

        let state: serde_json::Value = serde_json::from_str(&text(&state_impl(&agent).await.unwrap())).unwrap();
        assert_eq!(state["state"], "activated");
        assert_eq!(state["skip_waiting"], true);
    }

    #[tokio::test]
    async fn test_activate_before_install_is_error() {
        let db = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let agent = agent_with("v1", AssetManifest::new(Vec::new()), db, Arc::new(FakeFetcher::new()));

        let err = activate_impl(&agent).await.unwrap_err();
        assert_eq!(err.code.0, -32014);
    }
}
