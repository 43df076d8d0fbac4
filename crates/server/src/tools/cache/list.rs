//! cache_list tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{CacheDb, EntryMeta, Error, PartitionSummary};

use crate::tools::json_result;

/// Parameters for the cache_list tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheListParams {
    /// List the entries of this partition. When omitted only partitions are listed.
    #[serde(default)]
    pub partition: Option<String>,
}

/// Output from the cache_list tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheListOutput {
    pub partitions: Vec<PartitionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<EntryMeta>>,
}

/// Implementation of the cache_list tool.
pub async fn list_impl(cache: &CacheDb, params: CacheListParams) -> Result<CallToolResult, McpError> {
    let partitions = cache.list_partitions().await?;

    let entries = match params.partition {
        Some(name) => {
            if !partitions.iter().any(|p| p.name == name) {
                return Err(Error::CacheMiss(format!("no partition named {name}")).into());
            }
            Some(cache.list_entries(&name).await?)
        }
        None => None,
    };

    json_result(&CacheListOutput { partitions, entries })
}
