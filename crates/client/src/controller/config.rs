//! Resolved, immutable controller configuration.

use std::collections::HashSet;

use shellcache_core::config::DevSubstitution;
use shellcache_core::{AppConfig, Error};
use url::Url;

use crate::fetch::{canonicalize, resolve};

/// The three pages the preload partition must always hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoints {
    pub offline: Url,
    pub main: Url,
    pub file_open: Url,
}

impl EntryPoints {
    pub fn iter(&self) -> impl Iterator<Item = &Url> {
        [&self.offline, &self.main, &self.file_open].into_iter()
    }
}

/// Hosts whose responses must never be written to a partition.
///
/// Entries match either the bare hostname or `host:port`, so a local model
/// server on `localhost:11434` can be denied without denying the dev server
/// on `localhost:3000`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostDenylist {
    entries: HashSet<String>,
}

impl HostDenylist {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = hosts
            .into_iter()
            .map(|h| h.as_ref().trim().to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .collect();
        Self { entries }
    }

    pub fn contains(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        if self.entries.contains(host) {
            return true;
        }
        url.port_or_known_default()
            .is_some_and(|port| self.entries.contains(&format!("{host}:{port}")))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything the controller needs, resolved once at construction.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub app_name: String,
    pub version: String,
    pub origin: Url,
    pub preload_cache: String,
    pub offline_cache: String,
    pub entry_points: EntryPoints,
    pub essential: Vec<Url>,
    pub static_assets: Vec<Url>,
    pub denylist: HostDenylist,
    pub api_prefix: String,
    pub version_path: String,
    pub dev_hostnames: Vec<String>,
    pub dev_substitutions: Vec<DevSubstitution>,
    pub navigation_preload: bool,
    pub evict_stale_partitions: bool,
}

impl ControllerConfig {
    /// Resolve an [`AppConfig`] against its origin.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` if the origin or any entry point or
    /// manifest entry cannot be resolved to an http(s) URL.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("origin: {e}")))?;
        let at = |entry: &str| resolve(&origin, entry).map_err(|e| Error::InvalidUrl(e.to_string()));

        let entry_points = EntryPoints {
            offline: at(&config.offline_page)?,
            main: at(&config.main_page)?,
            file_open: at(&config.file_open_page)?,
        };
        let essential = config.essential.iter().map(|e| at(e)).collect::<Result<Vec<_>, _>>()?;
        let static_assets = config.static_assets.iter().map(|e| at(e)).collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            app_name: config.app_name.clone(),
            version: config.version.clone(),
            preload_cache: config.preload_cache.clone(),
            offline_cache: config.offline_cache.clone(),
            entry_points,
            essential,
            static_assets,
            denylist: HostDenylist::new(&config.non_cacheable_hosts),
            api_prefix: config.api_prefix.clone(),
            version_path: config.version_path.clone(),
            dev_hostnames: config.dev_hostnames.iter().map(|h| h.to_ascii_lowercase()).collect(),
            dev_substitutions: config.dev_substitutions.clone(),
            navigation_preload: config.navigation_preload,
            evict_stale_partitions: config.evict_stale_partitions,
            origin,
        })
    }

    /// Whether a response for `url` may never be stored.
    pub fn is_non_cacheable(&self, url: &Url) -> bool {
        self.denylist.contains(url) || url.path().starts_with(&self.api_prefix)
    }

    pub fn is_dev_host(&self, url: &Url) -> bool {
        url.host_str()
            .is_some_and(|host| self.dev_hostnames.iter().any(|h| h == host))
    }

    pub fn partition_names(&self) -> [&str; 2] {
        [self.preload_cache.as_str(), self.offline_cache.as_str()]
    }

    /// Turn user input into a request URL: paths starting with `/` are
    /// joined onto the origin, anything else is canonicalized as a full URL.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidUrl` for empty, unparseable or non-http(s) input.
    pub fn target(&self, input: &str) -> Result<Url, Error> {
        let trimmed = input.trim();
        let url = if trimmed.starts_with('/') { resolve(&self.origin, trimmed) } else { canonicalize(trimmed) };
        url.map_err(|e| Error::InvalidUrl(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_denylist_hostname_match() {
        let deny = HostDenylist::new(["Generativelanguage.googleapis.com", " "]);
        assert_eq!(deny.len(), 1);
        assert!(deny.contains(&url("https://generativelanguage.googleapis.com/v1beta/models")));
        assert!(!deny.contains(&url("https://googleapis.com/")));
    }

    #[test]
    fn test_denylist_host_port_match() {
        let deny = HostDenylist::new(["localhost:11434"]);
        assert!(deny.contains(&url("http://localhost:11434/api/generate")));
        assert!(!deny.contains(&url("http://localhost:3000/app.js")));
    }

    #[test]
    fn test_denylist_known_default_port() {
        let deny = HostDenylist::new(["api.github.com:443"]);
        assert!(deny.contains(&url("https://api.github.com/repos")));
        assert!(!deny.contains(&url("http://api.github.com/repos")));
    }

    #[test]
    fn test_from_app_config_resolves_urls() {
        let app = AppConfig { origin: "https://code.example.com/".into(), ..Default::default() };
        let config = ControllerConfig::from_app_config(&app).unwrap();

        assert_eq!(config.entry_points.offline.as_str(), "https://code.example.com/offline.html");
        assert_eq!(config.entry_points.main.as_str(), "https://code.example.com/");
        assert_eq!(config.entry_points.file_open.as_str(), "https://code.example.com/open.html");
        assert_eq!(config.entry_points.iter().count(), 3);
        assert!(config.essential.iter().all(|u| u.host_str() == Some("code.example.com")));
        assert_eq!(config.partition_names(), ["preload", "offline"]);
    }

    #[test]
    fn test_from_app_config_rejects_bad_entry() {
        let app = AppConfig { static_assets: vec!["javascript:alert(1)".into()], ..Default::default() };
        let result = ControllerConfig::from_app_config(&app);
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_non_cacheable_covers_api_prefix() {
        let config = ControllerConfig::from_app_config(&AppConfig::default()).unwrap();
        assert!(config.is_non_cacheable(&url("http://localhost:3000/api/files")));
        assert!(config.is_non_cacheable(&url("https://api.openai.com/v1/chat/completions")));
        assert!(!config.is_non_cacheable(&url("http://localhost:3000/app.js")));
    }

    #[test]
    fn test_dev_host() {
        let config = ControllerConfig::from_app_config(&AppConfig::default()).unwrap();
        assert!(config.is_dev_host(&url("http://localhost:3000/")));
        assert!(config.is_dev_host(&url("http://127.0.0.1:8080/")));
        assert!(!config.is_dev_host(&url("https://code.example.com/")));
    }

    #[test]
    fn test_target() {
        let app = AppConfig { origin: "https://code.example.com/".into(), ..Default::default() };
        let config = ControllerConfig::from_app_config(&app).unwrap();

        assert_eq!(config.target("/app.js").unwrap().as_str(), "https://code.example.com/app.js");
        assert_eq!(config.target(" cdn.example.net/ace.js ").unwrap().as_str(), "https://cdn.example.net/ace.js");
        assert!(matches!(config.target(""), Err(Error::InvalidUrl(_))));
        assert!(matches!(config.target("ftp://code.example.com/"), Err(Error::InvalidUrl(_))));
    }
}
