//! cache_keys tool implementation.
//!
//! Lists bucket names, and optionally the entries of one bucket.

use offline_core::{CacheDb, Error, cache::EntrySummary};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::lifecycle::json_result;

/// Parameters for the cache_keys tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysParams {
    /// List the entries stored in this bucket as well.
    #[serde(default)]
    pub bucket: Option<String>,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct CacheKeysOutput {
    /// Bucket names, oldest first.
    pub buckets: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<EntrySummary>>,
}

pub async fn keys_impl(cache: &CacheDb, params: CacheKeysParams) -> Result<CallToolResult, McpError> {
    let buckets = cache.bucket_names().await?;

    let entries = match params.bucket {
        Some(bucket) if !buckets.contains(&bucket) => {
            return Err(Error::InvalidInput(format!("no such bucket: {bucket}")).into());
        }
        Some(bucket) => Some(cache.list_entries(&bucket).await?),
        None => None,
    };

    json_result(&CacheKeysOutput { buckets, entries })
}
