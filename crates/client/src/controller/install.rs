//! Install phase: open and populate the partitions.

use futures::future::{join, join_all};
use serde::Serialize;
use shellcache_core::{CacheMode, Error, Request};
use url::Url;

use super::{Controller, Phase};
use crate::fetch::Network;

/// Counts of what happened to each manifest entry during install.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    /// Entry points written to the preload partition.
    pub entry_points: usize,
    /// Manifest entries fetched and written.
    pub cached: usize,
    /// Static entries already present, not fetched again.
    pub already_cached: usize,
    /// Entries on the non-cacheable list, never fetched.
    pub skipped: usize,
    /// Entries whose fetch or write failed.
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Refresh {
    Always,
    IfMissing,
}

enum EntryOutcome {
    Cached,
    AlreadyCached,
    Skipped,
    Failed(String),
}

impl InstallReport {
    fn record(&mut self, outcome: EntryOutcome) {
        match outcome {
            EntryOutcome::Cached => self.cached += 1,
            EntryOutcome::AlreadyCached => self.already_cached += 1,
            EntryOutcome::Skipped => self.skipped += 1,
            EntryOutcome::Failed(url) => self.failed.push(url),
        }
    }
}

impl<N: Network> Controller<N> {
    /// Open both partitions and fill them for this version.
    ///
    /// The three entry points must all be fetched with a 200, or the install
    /// fails and the controller becomes `Redundant`. Manifest entries are
    /// best effort: essential entries are always refetched, static entries
    /// only when missing, and failures are logged and reported.
    ///
    /// # Errors
    ///
    /// Returns `Error::Lifecycle` unless the controller is `Pending`, and
    /// `Error::InstallFailed` if an entry point could not be cached.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        let phase = self.phase().await;
        if phase != Phase::Pending {
            return Err(Error::Lifecycle(format!("cannot install from {phase}")));
        }

        match self.populate().await {
            Ok(report) => {
                self.set_phase(Phase::Installed).await;
                tracing::info!(
                    version = %self.config.version,
                    cached = report.cached,
                    already_cached = report.already_cached,
                    skipped = report.skipped,
                    failed = report.failed.len(),
                    "install complete, skipping wait"
                );
                Ok(report)
            }
            Err(e) => {
                self.set_phase(Phase::Redundant).await;
                tracing::error!(version = %self.config.version, error = %e, "install failed");
                Err(e)
            }
        }
    }

    async fn populate(&self) -> Result<InstallReport, Error> {
        let preload = self.config.preload_cache.as_str();
        let offline = self.config.offline_cache.as_str();

        self.db.open_partition(preload).await?;
        self.db.open_partition(offline).await?;

        let mut report = InstallReport::default();
        for url in self.config.entry_points.iter() {
            self.precache(preload, url)
                .await
                .map_err(|e| Error::InstallFailed(format!("{url}: {e}")))?;
            report.entry_points += 1;
        }

        let essential = join_all(
            self.config
                .essential
                .iter()
                .map(|url| self.populate_entry(offline, url, Refresh::Always)),
        );
        let statics = join_all(
            self.config
                .static_assets
                .iter()
                .map(|url| self.populate_entry(offline, url, Refresh::IfMissing)),
        );
        let (essential, statics) = join(essential, statics).await;

        for outcome in essential.into_iter().chain(statics) {
            report.record(outcome);
        }
        Ok(report)
    }

    async fn populate_entry(&self, partition: &str, url: &Url, refresh: Refresh) -> EntryOutcome {
        if self.config.is_non_cacheable(url) {
            tracing::debug!(%url, "skipping non-cacheable manifest entry");
            return EntryOutcome::Skipped;
        }

        if refresh == Refresh::IfMissing {
            match self.db.contains_entry(partition, url.as_str()).await {
                Ok(true) => return EntryOutcome::AlreadyCached,
                Ok(false) => {}
                Err(e) => tracing::warn!(%url, error = %e, "cache lookup failed, refetching"),
            }
        }

        match self.precache(partition, url).await {
            Ok(()) => EntryOutcome::Cached,
            Err(e) => {
                tracing::warn!(%url, error = %e, "failed to cache manifest entry");
                EntryOutcome::Failed(url.to_string())
            }
        }
    }

    /// Fetch `url` past any HTTP cache and store it; anything but a stored 200 is an error.
    async fn precache(&self, partition: &str, url: &Url) -> Result<(), Error> {
        let request = Request::get(url.clone()).with_cache(CacheMode::Reload);
        let response = self.network.fetch(&request).await?;

        if !response.is_cacheable_status() {
            return Err(Error::HttpError(format!("status {}", response.status)));
        }
        if !self.commit(partition, url, &response).await? {
            return Err(Error::InvalidInput(format!("{url} is not cacheable")));
        }
        Ok(())
    }
}
