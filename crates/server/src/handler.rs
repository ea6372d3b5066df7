//! MCP server handler implementation.
//!
//! Each tool stands in for one host event delivered to the agent.
use std::sync::Arc;

use crate::agent::Agent;
use crate::tools::{CacheKeysParams, SwFetchParams, activate_impl, fetch_impl, install_impl, keys_impl, state_impl};

use offline_core::{CacheDb, Fetcher};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

#[derive(Clone)]
pub struct OfflineAgentServer {
    tool_router: ToolRouter<Self>,
    agent: Arc<Agent>,
    cache: Arc<CacheDb>,
    /// Used for requests the agent passes through.
    network: Arc<dyn Fetcher>,
}

#[tool_router]
impl OfflineAgentServer {
    pub fn new(agent: Arc<Agent>, cache: Arc<CacheDb>, network: Arc<dyn Fetcher>) -> Self {
        Self { tool_router: Self::tool_router(), agent, cache, network }
    }

    #[tool(description = "Deliver the install event: pre-cache the asset manifest into the current version's bucket.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.agent).await
    }

    #[tool(description = "Deliver the activate event: delete every bucket except the current version and claim open pages.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.agent).await
    }

    /// Deliver a fetch event for one page request.
    ///
    /// GET requests are answered cache-first once the agent is activated;
    /// everything else is fetched directly.
    #[tool(
        description = "Deliver a fetch event. Returns outcome (passthrough, cache, network, stored, no_response), status, content_type and body."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.agent, self.network.as_ref(), params.0).await
    }

    #[tool(description = "List cache bucket names, oldest first. Pass bucket to list its entries too.")]
    async fn cache_keys(&self, params: Parameters<CacheKeysParams>) -> Result<CallToolResult, McpError> {
        keys_impl(&self.cache, params.0).await
    }

    #[tool(description = "Report the agent's lifecycle state.")]
    async fn sw_state(&self) -> Result<CallToolResult, McpError> {
        state_impl(&self.agent).await
    }
}

impl ServerHandler for OfflineAgentServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "offline-agent".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{FakeFetcher, agent_with};
    use offline_core::AssetManifest;

    #[tokio::test]
    async fn test_tools_registered() {
        let cache = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let fetcher = Arc::new(FakeFetcher::new());
        let agent = Arc::new(agent_with("v1", AssetManifest::new(Vec::new()), cache.clone(), fetcher.clone()));
        let server = OfflineAgentServer::new(agent, cache, fetcher);

        let mut names: Vec<String> = server.tool_router.list_all().into_iter().map(|t| t.name.to_string()).collect();
        names.sort();
        assert_eq!(names, vec!["cache_keys", "sw_activate", "sw_fetch", "sw_install", "sw_state"]);
        assert_eq!(server.get_info().server_info.name, "offline-agent");
    }
}
