//! Offline cache controller.
//!
//! The controller sits between the application shell and the network. It
//! moves through an explicit lifecycle:
//!
//! - **Pending**: constructed, not intercepting anything.
//! - **Installed**: partitions opened and populated; skip-waiting is implied,
//!   so activation may follow immediately.
//! - **Active**: claims every client; each request is classified and answered
//!   by one of the strategies in `strategy`.
//! - **Redundant**: install failed; the controller only passes requests
//!   through.
//!
//! Every write into a partition goes through [`Controller::commit`], which
//! enforces the two storage rules: only exact-200 responses, and never a
//! non-cacheable URL.

pub mod classify;
pub mod config;
mod install;
mod strategy;

#[cfg(test)]
pub(crate) mod testing;

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{CacheDb, Error, Response};
use tokio::sync::RwLock;
use url::Url;

use crate::fetch::Network;

pub use classify::{PassReason, Route, classify};
pub use config::{ControllerConfig, EntryPoints, HostDenylist};
pub use install::InstallReport;

/// Settings key recording the version whose install completed and activated.
pub const ACTIVE_VERSION_KEY: &str = "active_version";

/// Lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Pending,
    Installed,
    Active,
    Redundant,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Pending => "pending",
            Phase::Installed => "installed",
            Phase::Active => "active",
            Phase::Redundant => "redundant",
        };
        f.write_str(name)
    }
}

/// Where a response handed back to the page came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    Cache,
    OfflineFallback,
    Synthesized,
}

/// The answer to one intercepted request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub response: Response,
    pub source: ResponseSource,
}

impl FetchOutcome {
    pub(crate) fn network(response: Response) -> Self {
        Self { response, source: ResponseSource::Network }
    }

    pub(crate) fn synthesized(response: Response) -> Self {
        Self { response, source: ResponseSource::Synthesized }
    }
}

#[derive(Debug, Clone, Copy)]
struct State {
    phase: Phase,
    navigation_preload: bool,
}

/// The offline cache controller for one shell version.
pub struct Controller<N> {
    config: ControllerConfig,
    db: CacheDb,
    network: N,
    state: RwLock<State>,
}

impl<N: Network> Controller<N> {
    pub fn new(config: ControllerConfig, db: CacheDb, network: N) -> Self {
        Self {
            config,
            db,
            network,
            state: RwLock::new(State { phase: Phase::Pending, navigation_preload: false }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn db(&self) -> &CacheDb {
        &self.db
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub async fn phase(&self) -> Phase {
        self.state.read().await.phase
    }

    pub async fn navigation_preload_enabled(&self) -> bool {
        self.state.read().await.navigation_preload
    }

    /// Bring the controller to `Active`.
    ///
    /// An install runs once per version: if the settings store says this
    /// version already activated and the offline page is still in the preload
    /// partition, the controller resumes as active without touching the
    /// network.
    ///
    /// # Errors
    ///
    /// Propagates install and activate failures.
    pub async fn start(&self) -> Result<Phase, Error> {
        let active_version = self.db.get_setting(ACTIVE_VERSION_KEY).await?;
        let shell_present = self
            .db
            .contains_entry(&self.config.preload_cache, self.config.entry_points.offline.as_str())
            .await?;

        if active_version.as_deref() == Some(self.config.version.as_str()) && shell_present {
            let mut state = self.state.write().await;
            if state.phase == Phase::Pending {
                state.phase = Phase::Active;
                state.navigation_preload = self.preload_supported();
                tracing::info!(version = %self.config.version, "resumed active controller");
            }
            return Ok(state.phase);
        }

        tracing::info!(
            previous = active_version.as_deref().unwrap_or("none"),
            version = %self.config.version,
            "installing new controller version"
        );
        self.install().await?;
        self.activate().await?;
        Ok(Phase::Active)
    }

    /// Take over from any previous version and start intercepting.
    ///
    /// # Errors
    ///
    /// Returns `Error::Lifecycle` unless the controller is `Installed`, or a
    /// cache error if stale partitions cannot be evicted or the active version
    /// cannot be recorded.
    pub async fn activate(&self) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if state.phase != Phase::Installed {
            return Err(Error::Lifecycle(format!("cannot activate from {}", state.phase)));
        }

        if self.config.evict_stale_partitions {
            let evicted = self.db.delete_partitions_except(&self.config.partition_names()).await?;
            if !evicted.is_empty() {
                tracing::info!(?evicted, "evicted stale partitions");
            }
        }

        let navigation_preload = self.preload_supported();
        self.db.set_setting(ACTIVE_VERSION_KEY, &self.config.version).await?;

        state.phase = Phase::Active;
        state.navigation_preload = navigation_preload;
        tracing::info!(version = %self.config.version, navigation_preload, "controller active, clients claimed");
        Ok(())
    }

    fn preload_supported(&self) -> bool {
        self.config.navigation_preload && self.network.supports_navigation_preload()
    }

    async fn set_phase(&self, phase: Phase) {
        self.state.write().await.phase = phase;
    }

    /// Store `response` under `url` in `partition` if it is allowed to be cached.
    ///
    /// Returns whether the entry was written.
    pub(crate) async fn commit(&self, partition: &str, url: &Url, response: &Response) -> Result<bool, Error> {
        if !response.is_cacheable_status() {
            tracing::trace!(%url, status = response.status, "not caching non-200 response");
            return Ok(false);
        }
        if self.config.is_non_cacheable(url) {
            tracing::warn!(%url, partition, "refusing to cache non-cacheable URL");
            return Ok(false);
        }

        self.db.put_entry(partition, url, response).await?;
        tracing::debug!(%url, partition, bytes = response.body.len(), "cached response");
        Ok(true)
    }

    /// [`commit`](Self::commit) for request paths, where a failed write must not fail the request.
    async fn store(&self, partition: &str, url: &Url, response: &Response) {
        if let Err(e) = self.commit(partition, url, response).await {
            tracing::warn!(%url, partition, error = %e, "failed to write cache entry");
        }
    }
}
