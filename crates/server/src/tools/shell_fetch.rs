//! shell_fetch tool implementation.
//!
//! Routes one request through the controller, exactly as an intercepted
//! page request would be answered.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::{Controller, Network, ResponseSource};
use shellcache_core::{Request, RequestMode};

use super::json_result;

/// Input parameters for the shell_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ShellFetchParams {
    /// Absolute URL, or a path starting with `/` resolved against the shell origin.
    pub url: String,

    /// Issue the request as a top-level navigation.
    #[serde(default)]
    pub navigate: bool,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Include the response body as text in the output (default: true).
    #[serde(default = "default_true")]
    pub include_body: bool,
}

fn default_method() -> String {
    "GET".into()
}

fn default_true() -> bool {
    true
}

/// Output structure for the shell_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ShellFetchOutput {
    /// The resolved request URL.
    pub url: String,
    pub status: u16,
    pub source: ResponseSource,
    pub headers: Vec<(String, String)>,
    pub body_bytes: usize,
    /// Body decoded as UTF-8 (lossy), when requested.
    pub body: Option<String>,
}

/// Implementation of the shell_fetch tool.
pub async fn shell_fetch_impl<N: Network>(
    controller: &Controller<N>, params: ShellFetchParams,
) -> Result<CallToolResult, McpError> {
    let url = controller.config().target(&params.url)?;

    let mut request = Request::get(url).with_method(params.method);
    if params.navigate {
        request.mode = RequestMode::Navigate;
    }

    let outcome = controller.handle_fetch(&request).await?;
    tracing::debug!(url = %request.url, status = outcome.response.status, source = ?outcome.source, "shell_fetch");

    let body = params.include_body.then(|| outcome.response.text());
    let output = ShellFetchOutput {
        url: request.url.to_string(),
        status: outcome.response.status,
        source: outcome.source,
        body_bytes: outcome.response.body.len(),
        headers: outcome.response.headers,
        body,
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::super::testing::{active_controller, controller, output};
    use super::*;

    fn params(url: &str) -> ShellFetchParams {
        ShellFetchParams { url: url.into(), navigate: false, method: default_method(), include_body: true }
    }

    #[tokio::test]
    async fn test_shell_fetch_version_probe() {
        let controller = active_controller().await;
        let result = shell_fetch_impl(&controller, params("/version.json")).await.unwrap();
        let out: ShellFetchOutput = output(&result);

        assert_eq!(out.status, 200);
        assert_eq!(out.source, ResponseSource::Synthesized);
        assert_eq!(out.body.as_deref(), Some(r#"{"appName":"code-editor","version":"2.0.0"}"#));
    }

    #[tokio::test]
    async fn test_shell_fetch_cached_asset() {
        let controller = active_controller().await;
        let result = shell_fetch_impl(&controller, params("https://code.example.com/app.js")).await.unwrap();
        let out: ShellFetchOutput = output(&result);

        assert_eq!(out.source, ResponseSource::Cache);
        assert_eq!(out.body.as_deref(), Some("GET https://code.example.com/app.js"));
    }

    #[tokio::test]
    async fn test_shell_fetch_navigation_offline() {
        let controller = active_controller().await;
        controller.network().set_offline(true);

        let request = ShellFetchParams { navigate: true, include_body: false, ..params("/editor") };
        let out: ShellFetchOutput = output(&shell_fetch_impl(&controller, request).await.unwrap());

        assert_eq!(out.source, ResponseSource::OfflineFallback);
        assert_eq!(out.url, "https://code.example.com/editor");
        assert!(out.body.is_none());
        assert!(out.body_bytes > 0);
    }

    #[tokio::test]
    async fn test_shell_fetch_source_is_snake_case() {
        let controller = active_controller().await;
        controller.network().set_offline(true);

        let request = ShellFetchParams { navigate: true, ..params("/") };
        let result = shell_fetch_impl(&controller, request).await.unwrap();
        let raw: serde_json::Value = output(&result);
        assert_eq!(raw["source"], "offline_fallback");
    }

    #[tokio::test]
    async fn test_shell_fetch_passthrough_error() {
        let controller = active_controller().await;
        controller.network().set_offline(true);

        let err = shell_fetch_impl(&controller, params("https://api.openai.com/v1/models"))
            .await
            .unwrap_err();
        assert_eq!(err.code.0, -32004);
    }

    #[tokio::test]
    async fn test_shell_fetch_invalid_url() {
        let controller = controller().await;
        let err = shell_fetch_impl(&controller, params("")).await.unwrap_err();
        assert_eq!(err.code.0, -32003);
    }
}
