//! Request classification.
//!
//! Decides, from the request alone, which strategy answers it. First match
//! wins, and nothing here touches a partition or the network.

use shellcache_core::Request;
use url::Url;

use super::config::ControllerConfig;

/// Why a request skips the partitions entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassReason {
    DeniedHost,
    ApiPrefix,
    Method,
}

/// How a request is answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Answered by the controller with its identity and version.
    VersionProbe,
    /// Forwarded to the network with no cache read or write.
    Passthrough(PassReason),
    /// Network first, offline page on failure.
    Navigation,
    /// Development build asset, fetched from the substituted URL.
    DevSubstitute(Url),
    /// Cache first from the offline partition.
    Asset,
}

pub fn classify(config: &ControllerConfig, request: &Request) -> Route {
    let path = request.path();

    if path == config.version_path {
        return Route::VersionProbe;
    }

    if config.denylist.contains(&request.url) {
        return Route::Passthrough(PassReason::DeniedHost);
    }
    if path.starts_with(&config.api_prefix) {
        return Route::Passthrough(PassReason::ApiPrefix);
    }
    if !request.is_get() {
        return Route::Passthrough(PassReason::Method);
    }

    if request.is_navigation() {
        return Route::Navigation;
    }

    if config.is_dev_host(&request.url)
        && let Some(url) = dev_substitute(config, &request.url)
    {
        return Route::DevSubstitute(url);
    }

    Route::Asset
}

fn dev_substitute(config: &ControllerConfig, url: &Url) -> Option<Url> {
    let path = url.path();
    let file = path.rsplit('/').next().unwrap_or_default();
    let substitution = config.dev_substitutions.iter().find(|s| s.from == file)?;

    let mut substituted = url.clone();
    let prefix = &path[..path.len() - file.len()];
    substituted.set_path(&format!("{prefix}{}", substitution.to));
    Some(substituted)
}
