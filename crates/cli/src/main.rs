//! shellcache command line.
//!
//! Drives the offline cache controller against a local partition database:
//! install and activate a shell version, route single requests, and inspect or
//! purge what is stored. Results are printed as JSON on stdout; logs go to
//! stderr.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use figment::providers::{Format, Serialized, Toml};
use serde_json::json;
use shellcache_client::controller::ACTIVE_VERSION_KEY;
use shellcache_client::{Controller, ControllerConfig, FetchConfig, HttpNetwork};
use shellcache_core::{AppConfig, CacheDb, PurgeFilter, Request, RequestMode};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "shellcache")]
#[command(about = "Offline cache controller for a browser-hosted code editor shell")]
#[command(version)]
struct Cli {
    /// TOML config file, layered over `SHELLCACHE_CONFIG_FILE` and the environment
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Partition database path
    #[arg(long, global = true, env = "SHELLCACHE_DB_PATH")]
    db: Option<PathBuf>,

    /// Log level for stderr output (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Install and activate the configured version, or resume it
    Start,

    /// Route one request through the controller
    Fetch {
        /// Absolute URL, or a path starting with `/` on the shell origin
        url: String,

        /// Issue the request as a top-level navigation
        #[arg(long)]
        navigate: bool,

        #[arg(long, default_value = "GET")]
        method: String,

        /// Print the response body instead of a JSON summary
        #[arg(long)]
        body: bool,
    },

    /// Show the recorded active version and partition sizes
    Status,

    /// Inspect or purge stored responses
    #[command(subcommand)]
    Cache(CacheCommand),
}

#[derive(Subcommand, Debug)]
enum CacheCommand {
    /// List partitions, or the entries of one partition
    List { partition: Option<String> },

    /// Show metadata for one stored response
    Get {
        url: String,

        #[arg(long, short)]
        partition: Option<String>,
    },

    /// Delete entries by partition, host, or age
    Purge {
        #[arg(long)]
        partition: Option<String>,

        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        older_than_days: Option<i64>,
    },
}

impl Cli {
    fn app_config(&self) -> Result<AppConfig> {
        let mut figment = AppConfig::figment();
        if let Some(path) = &self.config {
            figment = figment.merge(Toml::file(path));
        }
        if let Some(db) = &self.db {
            figment = figment.merge(Serialized::default("db_path", db));
        }
        AppConfig::from_figment(figment).context("loading configuration")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let app = cli.app_config()?;
    let config = ControllerConfig::from_app_config(&app)?;
    let db = CacheDb::open(&app.db_path)
        .await
        .with_context(|| format!("opening {}", app.db_path.display()))?;

    match cli.command {
        Command::Start => {
            let controller = Controller::new(config, db, HttpNetwork::new(FetchConfig::from(&app))?);
            let phase = controller.start().await?;
            print_json(&json!({
                "phase": phase,
                "version": controller.config().version,
                "navigation_preload": controller.navigation_preload_enabled().await,
                "partitions": controller.db().list_partitions().await?,
            }))
        }
        Command::Fetch { url, navigate, method, body } => {
            let controller = Controller::new(config, db, HttpNetwork::new(FetchConfig::from(&app))?);
            if let Err(e) = controller.start().await {
                tracing::warn!(error = %e, "controller not active, request will pass through");
            }

            let mut request = Request::get(controller.config().target(&url)?).with_method(method);
            if navigate {
                request.mode = RequestMode::Navigate;
            }
            let outcome = controller.handle_fetch(&request).await?;

            if body {
                println!("{}", outcome.response.text());
                return Ok(());
            }
            print_json(&json!({
                "url": request.url.as_str(),
                "status": outcome.response.status,
                "source": outcome.source,
                "headers": outcome.response.headers,
                "body_bytes": outcome.response.body.len(),
            }))
        }
        Command::Status => print_json(&json!({
            "app_name": config.app_name,
            "version": config.version,
            "active_version": db.get_setting(ACTIVE_VERSION_KEY).await?,
            "origin": config.origin.as_str(),
            "partitions": db.list_partitions().await?,
        })),
        Command::Cache(CacheCommand::List { partition: None }) => print_json(&db.list_partitions().await?),
        Command::Cache(CacheCommand::List { partition: Some(name) }) => print_json(&db.list_entries(&name).await?),
        Command::Cache(CacheCommand::Get { url, partition }) => {
            let url = config.target(&url)?;
            let partition = partition.unwrap_or_else(|| config.offline_cache.clone());
            let meta = db
                .get_entry_meta(&partition, url.as_str())
                .await?
                .with_context(|| format!("{url} is not cached in {partition}"))?;
            print_json(&meta)
        }
        Command::Cache(CacheCommand::Purge { partition, host, older_than_days }) => {
            let deleted = purge(&db, partition, host, older_than_days).await?;
            print_json(&json!({ "deleted": deleted }))
        }
    }
}

/// Validate every flag, then delete in one transaction.
async fn purge(db: &CacheDb, partition: Option<String>, host: Option<String>, older_than_days: Option<i64>) -> Result<u64> {
    let filter = PurgeFilter::new(partition, host, older_than_days).context("invalid purge flags")?;
    Ok(db.purge(&filter).await?)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
