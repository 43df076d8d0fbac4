//! cache_get tool implementation.
//!
//! Retrieves one stored response by partition and URL.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::{Controller, Network};
use shellcache_core::{EntryMeta, Error};

use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Absolute URL, or a path starting with `/` resolved against the shell origin.
    pub url: String,

    /// Partition to read (default: the offline partition).
    #[serde(default)]
    pub partition: Option<String>,

    /// Include the stored body as text (default: false).
    #[serde(default)]
    pub include_body: bool,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub meta: EntryMeta,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// Implementation of the cache_get tool.
pub async fn get_impl<N: Network>(controller: &Controller<N>, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url = controller.config().target(&params.url)?;
    let partition = params
        .partition
        .unwrap_or_else(|| controller.config().offline_cache.clone());
    let db = controller.db();

    let miss = || Error::CacheMiss(format!("{partition} {url}"));
    let meta = db.get_entry_meta(&partition, url.as_str()).await?.ok_or_else(miss)?;
    let response = db.match_response(&partition, url.as_str()).await?.ok_or_else(miss)?;

    let body = params.include_body.then(|| response.text());
    let output = CacheGetOutput { meta, headers: response.headers, body };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{active_controller, output};

    #[tokio::test]
    async fn test_get_impl_missing() {
        let controller = active_controller().await;
        let params = CacheGetParams { url: "/nonexistent.js".into(), partition: None, include_body: false };

        let err = get_impl(&controller, params).await.unwrap_err();
        assert_eq!(err.code.0, -32001);
    }

    #[tokio::test]
    async fn test_get_impl_found() {
        let controller = active_controller().await;
        let params = CacheGetParams { url: "/app.js".into(), partition: None, include_body: true };

        let out: CacheGetOutput = output(&get_impl(&controller, params).await.unwrap());
        assert_eq!(out.meta.partition, "offline");
        assert_eq!(out.meta.status, 200);
        assert_eq!(out.meta.host, "code.example.com");
        assert_eq!(out.body.as_deref(), Some("GET https://code.example.com/app.js"));
        assert_eq!(out.meta.body_len as usize, out.body.unwrap().len());
    }

    #[tokio::test]
    async fn test_get_impl_preload_partition() {
        let controller = active_controller().await;
        let params =
            CacheGetParams { url: "/offline.html".into(), partition: Some("preload".into()), include_body: false };

        let out: CacheGetOutput = output(&get_impl(&controller, params).await.unwrap());
        assert_eq!(out.meta.url, "https://code.example.com/offline.html");
        assert!(out.body.is_none());
        assert_eq!(out.headers, vec![("content-type".to_string(), "text/plain".to_string())]);
    }
}
