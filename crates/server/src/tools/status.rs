//! controller_status tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::{Controller, Network, controller::ACTIVE_VERSION_KEY};
use shellcache_core::PartitionSummary;

use super::json_result;

/// Output structure for the controller_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ControllerStatusOutput {
    pub app_name: String,
    /// Version this controller was built for.
    pub version: String,
    /// Version recorded by the last successful activation, if any.
    pub active_version: Option<String>,
    /// One of `pending`, `installed`, `active`, `redundant`.
    pub phase: String,
    pub navigation_preload: bool,
    pub origin: String,
    pub partitions: Vec<PartitionSummary>,
}

/// Implementation of the controller_status tool.
pub async fn status_impl<N: Network>(controller: &Controller<N>) -> Result<CallToolResult, McpError> {
    let config = controller.config();
    let output = ControllerStatusOutput {
        app_name: config.app_name.clone(),
        version: config.version.clone(),
        active_version: controller.db().get_setting(ACTIVE_VERSION_KEY).await?,
        phase: controller.phase().await.to_string(),
        navigation_preload: controller.navigation_preload_enabled().await,
        origin: config.origin.to_string(),
        partitions: controller.db().list_partitions().await?,
    };
    json_result(&output)
}
