//! URL canonicalization and manifest entry resolution.

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize a URL string typed by a user or passed over a tool call.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Default scheme to https:// if missing
/// 3. Lowercase the host
/// 4. Remove fragment (#...), which never reaches the network or a cache key
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let url_str = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };

    let parsed = url::Url::parse(&url_str).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    ensure_http(parsed)
}

/// Resolve a manifest entry against the shell origin.
///
/// Absolute entries (`https://cdn.example/lib.js`) are kept as-is, while
/// relative ones (`/app.js`, `icons/a.png`) are joined onto `origin`.
pub fn resolve(origin: &url::Url, entry: &str) -> Result<url::Url, UrlError> {
    let trimmed = entry.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let joined = origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(format!("{trimmed}: {e}")))?;
    ensure_http(joined)
}

fn ensure_http(mut parsed: url::Url) -> Result<url::Url, UrlError> {
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str() {
        let lowered = host.to_lowercase();
        parsed
            .set_host(Some(&lowered))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> url::Url {
        url::Url::parse("http://localhost:3000/").unwrap()
    }

    #[test]
    fn test_canonicalize_default_scheme() {
        let url = canonicalize("code.example.com/app.js").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("code.example.com"));
    }

    #[test]
    fn test_canonicalize_lowercase_host_and_drop_fragment() {
        let url = canonicalize("  https://CODE.example.com/index.html#editor  ").unwrap();
        assert_eq!(url.as_str(), "https://code.example.com/index.html");
    }

    #[test]
    fn test_canonicalize_preserve_query() {
        let url = canonicalize("https://example.com/app.js?v=3&b=1").unwrap();
        assert_eq!(url.query(), Some("v=3&b=1"));
    }

    #[test]
    fn test_canonicalize_rejects() {
        assert!(matches!(canonicalize(""), Err(UrlError::Empty)));
        assert!(matches!(canonicalize("   "), Err(UrlError::Empty)));
        assert!(matches!(canonicalize("file:///etc/passwd"), Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_resolve_relative_entries() {
        assert_eq!(resolve(&origin(), "/app.js").unwrap().as_str(), "http://localhost:3000/app.js");
        assert_eq!(
            resolve(&origin(), "icons/icon-192.png").unwrap().as_str(),
            "http://localhost:3000/icons/icon-192.png"
        );
        assert_eq!(resolve(&origin(), "/").unwrap().as_str(), "http://localhost:3000/");
    }

    #[test]
    fn test_resolve_absolute_entry() {
        let url = resolve(&origin(), "https://CDN.example/ace/ace.js#x").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example/ace/ace.js");
    }

    #[test]
    fn test_resolve_rejects() {
        assert!(matches!(resolve(&origin(), " "), Err(UrlError::Empty)));
        assert!(matches!(resolve(&origin(), "data:text/plain,hi"), Err(UrlError::UnsupportedScheme(_))));
    }
}
