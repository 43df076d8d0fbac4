//! Plain request/response contracts.
//!
//! These are the values the controller routes and the partitions store. They
//! carry no behaviour tied to a particular HTTP stack; the network layer
//! converts to and from its own types at the boundary.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use url::Url;

/// How the request was issued by the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level page load.
    Navigate,
    #[default]
    SameOrigin,
    NoCors,
    Cors,
}

/// Intermediate HTTP cache policy for the outgoing request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheMode {
    #[default]
    Default,
    /// Bypass any intermediate cache and revalidate with the origin.
    Reload,
}

/// An intercepted request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub url: Url,
    pub method: String,
    pub mode: RequestMode,
    pub cache: CacheMode,
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// A plain `GET` sub-resource request.
    pub fn get(url: Url) -> Self {
        Self { url, method: "GET".into(), mode: RequestMode::default(), cache: CacheMode::default(), headers: Vec::new() }
    }

    /// A top-level navigation request.
    pub fn navigate(url: Url) -> Self {
        Self { mode: RequestMode::Navigate, ..Self::get(url) }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into().to_ascii_uppercase();
        self
    }

    pub fn with_cache(mut self, cache: CacheMode) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Copy of this request pointed at another URL.
    pub fn with_url(&self, url: Url) -> Self {
        Self { url, ..self.clone() }
    }

    /// Lowercased hostname, empty for host-less URLs.
    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or("")
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }
}

/// A complete captured response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        Self { status, headers, body: body.into() }
    }

    /// Synthesized `404` with an empty body.
    pub fn not_found() -> Self {
        Self { status: 404, headers: Vec::new(), body: Bytes::new() }
    }

    /// Case-insensitive header lookup returning the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Only exactly-200 responses may be committed to a partition.
    pub fn is_cacheable_status(&self) -> bool {
        self.status == 200
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}
