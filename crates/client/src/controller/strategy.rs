//! Fetch phase: answer one intercepted request.

use serde::Serialize;
use shellcache_core::{Error, Request, Response};
use url::Url;

use super::classify::{Route, classify};
use super::{Controller, FetchOutcome, Phase, ResponseSource};
use crate::fetch::{NAVIGATION_PRELOAD_HEADER, Network};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VersionInfo<'a> {
    app_name: &'a str,
    version: &'a str,
}

impl<N: Network> Controller<N> {
    /// Answer an intercepted request.
    ///
    /// Cache and network failures on cacheable routes are absorbed: a failed
    /// navigation yields the offline page and a failed asset yields a
    /// synthesized 404.
    ///
    /// # Errors
    ///
    /// Only requests that bypass the partitions (denied hosts, the API
    /// prefix, non-GET methods, or any request while the controller is not
    /// active) surface network errors, since nothing could stand in for them.
    pub async fn handle_fetch(&self, request: &Request) -> Result<FetchOutcome, Error> {
        let state = *self.state.read().await;

        if state.phase != Phase::Active {
            tracing::trace!(url = %request.url, phase = %state.phase, "controller not active, passing through");
            return self.network.fetch(request).await.map(FetchOutcome::network);
        }

        match classify(&self.config, request) {
            Route::VersionProbe => Ok(FetchOutcome::synthesized(self.version_response())),
            Route::Passthrough(reason) => {
                tracing::debug!(url = %request.url, ?reason, "bypassing partitions");
                self.network.fetch(request).await.map(FetchOutcome::network)
            }
            Route::Navigation => Ok(self.network_first(request, state.navigation_preload).await),
            Route::DevSubstitute(url) => Ok(self.dev_substitute(request, url).await),
            Route::Asset => Ok(self.cache_first(request).await),
        }
    }

    fn version_response(&self) -> Response {
        let info = VersionInfo { app_name: &self.config.app_name, version: &self.config.version };
        Response::new(
            200,
            vec![
                ("content-type".into(), "application/json".into()),
                ("cache-control".into(), "no-store".into()),
            ],
            serde_json::to_vec(&info).unwrap_or_default(),
        )
    }

    async fn network_first(&self, request: &Request, preload: bool) -> FetchOutcome {
        let outgoing = if preload {
            request.clone().with_header(NAVIGATION_PRELOAD_HEADER, "true")
        } else {
            request.clone()
        };

        match self.network.fetch(&outgoing).await {
            Ok(response) => {
                self.store(&self.config.preload_cache, &request.url, &response).await;
                FetchOutcome::network(response)
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "navigation failed, serving offline page");
                self.offline_page().await
            }
        }
    }

    async fn offline_page(&self) -> FetchOutcome {
        let offline_url = self.config.entry_points.offline.as_str();
        match self.db.match_response(&self.config.preload_cache, offline_url).await {
            Ok(Some(page)) => FetchOutcome { response: page, source: ResponseSource::OfflineFallback },
            Ok(None) => {
                tracing::error!(url = offline_url, "offline page missing from preload partition");
                FetchOutcome::synthesized(Response::not_found())
            }
            Err(e) => {
                tracing::error!(url = offline_url, error = %e, "failed to read offline page");
                FetchOutcome::synthesized(Response::not_found())
            }
        }
    }

    async fn dev_substitute(&self, request: &Request, url: Url) -> FetchOutcome {
        tracing::debug!(from = %request.url, to = %url, "dev substitution");
        match self.network.fetch(&request.with_url(url)).await {
            Ok(response) => FetchOutcome::network(response),
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "dev asset unavailable");
                FetchOutcome::synthesized(Response::not_found())
            }
        }
    }

    async fn cache_first(&self, request: &Request) -> FetchOutcome {
        let partition = self.config.offline_cache.as_str();

        match self.db.match_response(partition, request.url.as_str()).await {
            Ok(Some(cached)) => {
                tracing::trace!(url = %request.url, "cache hit");
                return FetchOutcome { response: cached, source: ResponseSource::Cache };
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(url = %request.url, error = %e, "cache lookup failed, treating as miss"),
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                self.store(partition, &request.url, &response).await;
                FetchOutcome::network(response)
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "asset unavailable offline");
                FetchOutcome::synthesized(Response::not_found())
            }
        }
    }
}
