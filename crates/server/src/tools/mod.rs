//! MCP tool implementations.
//!
//! This module contains all tools exposed by the shellcache server. Each tool
//! is a plain `_impl` function so it can be tested without a transport.

pub mod cache;
pub mod shell_fetch;
pub mod status;

pub use shell_fetch::{ShellFetchParams, shell_fetch_impl};
pub use status::status_impl;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use shellcache_core::Error;

/// Serialize a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json =
        serde_json::to_string_pretty(output).map_err(|e| Error::InvalidInput(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use rmcp::model::CallToolResult;
    use shellcache_client::{Controller, ControllerConfig, Network};
    use shellcache_core::{AppConfig, CacheDb, Error, Request, Response};

    /// Answers every request with a 200 echoing its URL, or fails when offline.
    #[derive(Default)]
    pub struct EchoNetwork {
        offline: AtomicBool,
    }

    impl EchoNetwork {
        pub fn set_offline(&self, offline: bool) {
            self.offline.store(offline, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Network for EchoNetwork {
        async fn fetch(&self, request: &Request) -> Result<Response, Error> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(Error::Network(format!("{}: offline", request.url)));
            }
            Ok(Response::new(
                200,
                vec![("content-type".into(), "text/plain".into())],
                format!("{} {}", request.method, request.url),
            ))
        }
    }

    pub fn app_config() -> AppConfig {
        AppConfig {
            origin: "https://code.example.com/".into(),
            version: "2.0.0".into(),
            essential: vec!["/app.js".into()],
            static_assets: vec![],
            ..Default::default()
        }
    }

    pub async fn controller() -> Controller<EchoNetwork> {
        let config = ControllerConfig::from_app_config(&app_config()).unwrap();
        let db = CacheDb::open_in_memory().await.unwrap();
        Controller::new(config, db, EchoNetwork::default())
    }

    pub async fn active_controller() -> Controller<EchoNetwork> {
        let controller = controller().await;
        controller.start().await.unwrap();
        controller
    }

    /// Parse the JSON text content of a tool result.
    pub fn output<T: serde::de::DeserializeOwned>(result: &CallToolResult) -> T {
        let content = serde_json::to_value(&result.content[0]).unwrap();
        let text = content
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }
}
