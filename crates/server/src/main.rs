//! offline-agent entry point.
//!
//! Boots the offline cache agent and serves its lifecycle and fetch events
//! as MCP tools on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use offline_client::{FetchConfig, NetworkFetcher};
use offline_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod agent;
mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        version = %config.cache_version,
        scope = %config.scope,
        db = %config.db_path.display(),
        "starting offline-agent on stdio transport"
    );

    let cache = Arc::new(CacheDb::open(&config.db_path).await?);
    let network = Arc::new(NetworkFetcher::new(FetchConfig::from_app_config(&config))?);
    let agent = Arc::new(agent::Agent::new(config.agent_config()?, cache.clone(), network.clone()));

    let handler = handler::OfflineAgentServer::new(agent, cache, network);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
