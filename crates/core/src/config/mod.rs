//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELLCACHE_*)
//! 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// A `-dev` substitution applied to requests under a development hostname.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevSubstitution {
    /// Final path segment to match, e.g. `manifest.json`.
    pub from: String,
    /// Replacement written into the URL, e.g. `manifest-dev.json`.
    pub to: String,
}

impl DevSubstitution {
    fn new(from: &str, to: &str) -> Self {
        Self { from: from.into(), to: to.into() }
    }
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHELLCACHE_*)
/// 2. TOML config file (if SHELLCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application identity reported by the version probe.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Controller version. A change triggers a fresh install.
    #[serde(default = "default_version")]
    pub version: String,

    /// Origin the shell is served from; relative manifest entries resolve against it.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path to SQLite cache database.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Name of the navigation-shell partition.
    #[serde(default = "default_preload_cache")]
    pub preload_cache: String,

    /// Name of the general asset partition.
    #[serde(default = "default_offline_cache")]
    pub offline_cache: String,

    /// Page served when a navigation cannot reach the network.
    #[serde(default = "default_offline_page")]
    pub offline_page: String,

    /// Main entry page.
    #[serde(default = "default_main_page")]
    pub main_page: String,

    /// Entry page used when the app is launched to open a file.
    #[serde(default = "default_file_open_page")]
    pub file_open_page: String,

    /// Files force-refreshed on every install.
    #[serde(default = "default_essential")]
    pub essential: Vec<String>,

    /// Files cached once and kept until evicted.
    #[serde(default = "default_static_assets")]
    pub static_assets: Vec<String>,

    /// Hosts (`host` or `host:port`) whose responses are never cached.
    ///
    /// Set via SHELLCACHE_NON_CACHEABLE_HOSTS as an array, e.g. `[api.example.com, localhost:8080]`.
    #[serde(default = "default_non_cacheable_hosts")]
    pub non_cacheable_hosts: Vec<String>,

    /// Path prefix always forwarded to the network.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Reserved path answered by the controller itself.
    #[serde(default = "default_version_path")]
    pub version_path: String,

    /// Hostnames treated as a local development server.
    #[serde(default = "default_dev_hostnames")]
    pub dev_hostnames: Vec<String>,

    /// Development-only URL substitutions.
    #[serde(default = "default_dev_substitutions")]
    pub dev_substitutions: Vec<DevSubstitution>,

    /// Whether navigations announce themselves as preload requests.
    #[serde(default = "default_true")]
    pub navigation_preload: bool,

    /// Delete partitions not named above when activating.
    #[serde(default)]
    pub evict_stale_partitions: bool,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_app_name() -> String {
    "code-editor".into()
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").into()
}

fn default_origin() -> String {
    "http://localhost:3000/".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shellcache.sqlite")
}

fn default_preload_cache() -> String {
    "preload".into()
}

fn default_offline_cache() -> String {
    "offline".into()
}

fn default_offline_page() -> String {
    "/offline.html".into()
}

fn default_main_page() -> String {
    "/".into()
}

fn default_file_open_page() -> String {
    "/open.html".into()
}

fn default_essential() -> Vec<String> {
    ["/index.html", "/app.js", "/app.css", "/manifest.json"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_static_assets() -> Vec<String> {
    ["/favicon.ico", "/icons/icon-192.png", "/icons/icon-512.png", "/lib/ace/ace.js"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_non_cacheable_hosts() -> Vec<String> {
    [
        "generativelanguage.googleapis.com",
        "api.openai.com",
        "api.anthropic.com",
        "localhost:11434",
        "127.0.0.1:11434",
        "localhost:1234",
        "api.github.com",
        "raw.githubusercontent.com",
        "registry.npmjs.org",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_api_prefix() -> String {
    "/api/".into()
}

fn default_version_path() -> String {
    "/version.json".into()
}

fn default_dev_hostnames() -> Vec<String> {
    vec!["localhost".into(), "127.0.0.1".into()]
}

fn default_dev_substitutions() -> Vec<DevSubstitution> {
    vec![
        DevSubstitution::new("manifest.json", "manifest-dev.json"),
        DevSubstitution::new("favicon.ico", "favicon-dev.ico"),
    ]
}

fn default_user_agent() -> String {
    "shellcache/0.1".into()
}

fn default_max_bytes() -> usize {
    10_485_760 // 10MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            version: default_version(),
            origin: default_origin(),
            db_path: default_db_path(),
            preload_cache: default_preload_cache(),
            offline_cache: default_offline_cache(),
            offline_page: default_offline_page(),
            main_page: default_main_page(),
            file_open_page: default_file_open_page(),
            essential: default_essential(),
            static_assets: default_static_assets(),
            non_cacheable_hosts: default_non_cacheable_hosts(),
            api_prefix: default_api_prefix(),
            version_path: default_version_path(),
            dev_hostnames: default_dev_hostnames(),
            dev_substitutions: default_dev_substitutions(),
            navigation_preload: true,
            evict_stale_partitions: false,
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELLCACHE_`
    /// 2. TOML file from `SHELLCACHE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// Extract and validate configuration from an explicit provider stack.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::LoadFailed` if extraction fails, or the
    /// validation error for the first invalid field.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// The layered provider stack, exposed for callers that add their own layers.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHELLCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment.merge(
            Env::prefixed("SHELLCACHE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }

    /// Names of every partition this configuration owns.
    pub fn partition_names(&self) -> [&str; 2] {
        [self.preload_cache.as_str(), self.offline_cache.as_str()]
    }
}
