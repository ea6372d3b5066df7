//! URL canonicalization for network requests and origin checks.

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("relative URL without base: {0}")]
    Relative(String),

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize an absolute request URL before it goes to the network.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Require an absolute `http`/`https` URL
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = url::Url::parse(trimmed).map_err(|e| match e {
        url::ParseError::RelativeUrlWithoutBase => UrlError::Relative(trimmed.to_string()),
        other => UrlError::InvalidUrl(other.to_string()),
    })?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str().map(str::to_lowercase) {
        parsed
            .set_host(Some(&host))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Whether two URLs share scheme, host and port.
pub fn same_origin(a: &url::Url, b: &url::Url) -> bool {
    a.origin() == b.origin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_basic() {
        let url = canonicalize("https://example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn test_canonicalize_lowercase_host() {
        let url = canonicalize("https://CDN.Example.COM/lib.js").unwrap();
        assert_eq!(url.host_str(), Some("cdn.example.com"));
        assert_eq!(url.path(), "/lib.js");
    }

    #[test]
    fn test_canonicalize_remove_fragment_keep_query() {
        let url = canonicalize("https://fonts.example.com/css2?family=Inter&display=swap#x").unwrap();
        assert_eq!(url.query(), Some("family=Inter&display=swap"));
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_canonicalize_trim_whitespace() {
        let url = canonicalize("  http://localhost:8080/index.html  ").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/index.html");
    }

    #[test]
    fn test_canonicalize_relative_rejected() {
        assert!(matches!(canonicalize("./index.html"), Err(UrlError::Relative(_))));
    }

    #[test]
    fn test_canonicalize_extension_scheme_rejected() {
        let result = canonicalize("chrome-extension://abcdef/popup.html");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(s)) if s == "chrome-extension"));
    }

    #[test]
    fn test_canonicalize_empty() {
        assert!(matches!(canonicalize(""), Err(UrlError::Empty)));
        assert!(matches!(canonicalize("   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_same_origin() {
        let a = canonicalize("http://localhost:8080/a").unwrap();
        let b = canonicalize("http://localhost:8080/b?x=1").unwrap();
        let c = canonicalize("http://localhost:9090/a").unwrap();
        let d = canonicalize("https://localhost:8080/a").unwrap();
        assert!(same_origin(&a, &b));
        assert!(!same_origin(&a, &c));
        assert!(!same_origin(&a, &d));
    }
}
