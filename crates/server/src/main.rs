//! mcp-shellcache server entry point.
//!
//! Boots the offline cache controller and serves its tools over the MCP stdio
//! transport. Logging goes to stderr to avoid interfering with the JSON-RPC
//! protocol on stdout.

use std::sync::Arc;

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shellcache_client::{Controller, ControllerConfig, FetchConfig, HttpNetwork};
use shellcache_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let app = AppConfig::load().context("loading configuration")?;
    tracing::info!(app = %app.app_name, version = %app.version, db = %app.db_path.display(), "Starting mcp-shellcache server on stdio transport");

    let config = ControllerConfig::from_app_config(&app)?;
    let db = CacheDb::open(&app.db_path).await?;
    let network = HttpNetwork::new(FetchConfig::from(&app))?;
    let controller = Arc::new(Controller::new(config, db, network));

    // A failed install leaves the controller redundant; it still passes
    // requests through and the cache tools keep working.
    if let Err(e) = controller.start().await {
        tracing::error!(error = %e, "controller did not activate");
    }

    let handler = handler::ShellCacheServer::new(controller);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
