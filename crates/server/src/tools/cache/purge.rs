//! cache_purge tool implementation.
//!
//! Purges cache entries by partition, host, or age.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{CacheDb, PurgeFilter};

use crate::tools::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Delete every entry in this partition.
    pub partition: Option<String>,

    /// Delete entries for this exact host, in every partition.
    pub host: Option<String>,

    /// Delete entries stored more than this many days ago.
    pub older_than_days: Option<i64>,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Number of entries deleted.
    pub deleted: u64,
}

/// Implementation of the cache_purge tool.
///
/// Parameters are validated in full before anything is deleted.
pub async fn purge_impl(cache: &CacheDb, params: CachePurgeParams) -> Result<CallToolResult, McpError> {
    let filter = PurgeFilter::new(params.partition, params.host, params.older_than_days)?;
    let deleted = cache.purge(&filter).await?;

    tracing::info!(deleted, ?filter, "cache purged");
    json_result(&CachePurgeOutput { deleted })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{active_controller, output};
    use shellcache_core::Response;
    use url::Url;

    async fn seeded() -> CacheDb {
        let cache = CacheDb::open_in_memory().await.unwrap();
        for url in ["https://code.example.com/app.js", "https://cdn.example.net/ace.js"] {
            cache
                .put_entry("offline", &Url::parse(url).unwrap(), &Response::new(200, vec![], "x"))
                .await
                .unwrap();
        }
        cache
    }

    #[tokio::test]
    async fn test_purge_by_host() {
        let cache = seeded().await;
        let params = CachePurgeParams { host: Some("CDN.example.net".into()), ..Default::default() };

        let out: CachePurgeOutput = output(&purge_impl(&cache, params).await.unwrap());
        assert_eq!(out.deleted, 1);
        assert!(cache.contains_entry("offline", "https://code.example.com/app.js").await.unwrap());
    }

    #[tokio::test]
    async fn test_purge_partition_keeps_partition() {
        let controller = active_controller().await;
        let params = CachePurgeParams { partition: Some("preload".into()), ..Default::default() };

        let out: CachePurgeOutput = output(&purge_impl(controller.db(), params).await.unwrap());
        assert_eq!(out.deleted, 3);
        assert!(controller.db().has_partition("preload").await.unwrap());
    }

    #[tokio::test]
    async fn test_purge_older_than() {
        let cache = seeded().await;

        let recent = CachePurgeParams { older_than_days: Some(1), ..Default::default() };
        let out: CachePurgeOutput = output(&purge_impl(&cache, recent).await.unwrap());
        assert_eq!(out.deleted, 0);

        std::thread::sleep(std::time::Duration::from_millis(5));
        let everything = CachePurgeParams { older_than_days: Some(0), ..Default::default() };
        let out: CachePurgeOutput = output(&purge_impl(&cache, everything).await.unwrap());
        assert_eq!(out.deleted, 2);
    }

    #[tokio::test]
    async fn test_rejected_purge_deletes_nothing() {
        let cache = seeded().await;
        let params = CachePurgeParams {
            partition: Some("offline".into()),
            host: Some("cdn.example.net".into()),
            older_than_days: Some(-1),
        };

        let err = purge_impl(&cache, params).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
        assert_eq!(cache.count_entries(None).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_purge_huge_day_count_is_rejected() {
        let cache = seeded().await;
        for days in [1_000_000_000, i64::MAX] {
            let params = CachePurgeParams { older_than_days: Some(days), ..Default::default() };
            let err = purge_impl(&cache, params).await.unwrap_err();
            assert_eq!(err.code.0, -32602);
        }
        assert_eq!(cache.count_entries(None).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_purge_no_params() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let result = purge_impl(&cache, CachePurgeParams::default()).await;
        assert!(result.is_err());
    }
}
