//! Scripted network and fixtures for controller tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use shellcache_core::{AppConfig, CacheDb, Error, Request, Response};

use super::{Controller, ControllerConfig};
use crate::fetch::Network;

pub(crate) const SHELL_URLS: [&str; 8] = [
    "https://code.example.com/offline.html",
    "https://code.example.com/",
    "https://code.example.com/open.html",
    "https://code.example.com/index.html",
    "https://code.example.com/app.js",
    "https://code.example.com/app.css",
    "https://code.example.com/icons/icon.png",
    "https://cdn.example.net/ace/ace.js",
];

/// Application config with a small manifest rooted at `https://code.example.com/`.
pub(crate) fn app_config() -> AppConfig {
    AppConfig {
        origin: "https://code.example.com/".into(),
        version: "1.0.0".into(),
        essential: vec!["/index.html".into(), "/app.js".into(), "/app.css".into()],
        static_assets: vec![
            "/icons/icon.png".into(),
            "https://cdn.example.net/ace/ace.js".into(),
            "https://generativelanguage.googleapis.com/v1beta/models".into(),
        ],
        ..Default::default()
    }
}

/// In-memory [`Network`] answering from a fixed table of URLs.
///
/// Unknown URLs get a 404; when offline every request fails with
/// `Error::Network`. Every request is recorded, including failed ones.
pub(crate) struct ScriptedNetwork {
    routes: Mutex<HashMap<String, Response>>,
    requests: Mutex<Vec<Request>>,
    offline: AtomicBool,
    preload: bool,
}

impl ScriptedNetwork {
    pub(crate) fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            offline: AtomicBool::new(false),
            preload: true,
        }
    }

    /// Serves every entry point and manifest URL of [`app_config`].
    pub(crate) fn serving_shell() -> Self {
        let network = Self::new();
        for url in SHELL_URLS {
            let content_type = match url.rsplit('.').next() {
                Some("js") => "text/javascript",
                Some("css") => "text/css",
                Some("png") => "image/png",
                _ => "text/html",
            };
            let response = Response::new(
                200,
                vec![("content-type".into(), content_type.into()), ("x-origin".into(), "network".into())],
                format!("body of {url}"),
            );
            network.routes.lock().unwrap().insert(url.to_string(), response);
        }
        network
    }

    pub(crate) fn without_preload(mut self) -> Self {
        self.preload = false;
        self
    }

    pub(crate) fn serve(&self, url: &str, status: u16, body: &str) {
        let response = Response::new(status, vec![("content-type".into(), "text/plain".into())], body.to_string());
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    pub(crate) fn response_for(&self, url: &str) -> Option<Response> {
        self.routes.lock().unwrap().get(url).cloned()
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn requests_for(&self, url: &str) -> Vec<Request> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.as_str() == url)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.requests.lock().unwrap().push(request.clone());
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("{}: offline", request.url)));
        }
        let response = self.routes.lock().unwrap().get(request.url.as_str()).cloned();
        Ok(response.unwrap_or_else(Response::not_found))
    }

    fn supports_navigation_preload(&self) -> bool {
        self.preload
    }
}

pub(crate) async fn fixture() -> Controller<ScriptedNetwork> {
    fixture_with(app_config(), ScriptedNetwork::serving_shell()).await
}

pub(crate) async fn fixture_with(app: AppConfig, network: ScriptedNetwork) -> Controller<ScriptedNetwork> {
    let config = ControllerConfig::from_app_config(&app).unwrap();
    let db = CacheDb::open_in_memory().await.unwrap();
    Controller::new(config, db, network)
}

/// A started controller over [`ScriptedNetwork::serving_shell`].
pub(crate) async fn active() -> Controller<ScriptedNetwork> {
    let controller = fixture().await;
    controller.start().await.unwrap();
    controller
}
