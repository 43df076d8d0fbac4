//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` for an empty `app_name` or `version`,
    /// and `ConfigError::Invalid` if:
    /// - `origin` is not an absolute http(s) URL
    /// - partition names are empty or identical
    /// - a reserved path does not start with `/`
    /// - a dev substitution has an empty source or target
    /// - `max_bytes` is 0 or exceeds 100MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_name.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "app_name".into(),
                hint: "Set SHELLCACHE_APP_NAME environment variable".into(),
            });
        }
        if self.version.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "version".into(),
                hint: "Set SHELLCACHE_VERSION environment variable".into(),
            });
        }

        match url::Url::parse(&self.origin) {
            Ok(origin) if matches!(origin.scheme(), "http" | "https") && origin.has_host() => {}
            Ok(_) => return Err(invalid("origin", "must be an absolute http(s) URL")),
            Err(e) => return Err(invalid("origin", &e.to_string())),
        }

        if self.preload_cache.is_empty() {
            return Err(invalid("preload_cache", "must not be empty"));
        }
        if self.offline_cache.is_empty() {
            return Err(invalid("offline_cache", "must not be empty"));
        }
        if self.preload_cache == self.offline_cache {
            return Err(invalid("offline_cache", "must differ from preload_cache"));
        }

        for (field, value) in [
            ("offline_page", &self.offline_page),
            ("main_page", &self.main_page),
            ("file_open_page", &self.file_open_page),
            ("api_prefix", &self.api_prefix),
            ("version_path", &self.version_path),
        ] {
            if !value.starts_with('/') {
                return Err(invalid(field, "must start with '/'"));
            }
        }

        if self.dev_substitutions.iter().any(|s| s.from.trim().is_empty()) {
            return Err(invalid("dev_substitutions", "substitution source must not be empty"));
        }
        if self.dev_substitutions.iter().any(|s| s.to.trim().is_empty()) {
            return Err(invalid("dev_substitutions", "substitution target must not be empty"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 100 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 100MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.evict_stale_partitions {
            tracing::warn!(
                preload = %self.preload_cache,
                offline = %self.offline_cache,
                "evict_stale_partitions is set; partitions with other names are deleted on activate"
            );
        }

        Ok(())
    }
}
