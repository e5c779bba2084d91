//! Extraction of the origin a request was addressed with.

use axum::http::{HeaderMap, Uri, header};
use hirepath_platform_access::Origin;

/// Header set by the reverse proxy to the client-facing host.
pub const FORWARDED_HOST_HEADER: &str = "x-forwarded-host";

/// Works out the request's own origin from what the server can see.
#[derive(Debug, Clone)]
pub struct RequestOriginResolver {
    scheme: String,
    fallback: Origin,
}

impl RequestOriginResolver {
    /// Creates a resolver using `scheme` for relative request URIs and
    /// `fallback` when the request carries no usable host.
    #[must_use]
    pub fn new(scheme: impl Into<String>, fallback: Origin) -> Self {
        Self {
            scheme: scheme.into(),
            fallback,
        }
    }

    /// Returns the origin for a request.
    ///
    /// Prefers the authority of an absolute request URI, then the `Host`
    /// header. Forwarded headers are not consulted here.
    #[must_use]
    pub fn resolve(&self, uri: &Uri, headers: &HeaderMap) -> Origin {
        let scheme = uri.scheme_str().unwrap_or(&self.scheme);
        let host = uri
            .authority()
            .map(|a| a.as_str())
            .or_else(|| headers.get(header::HOST).and_then(|v| v.to_str().ok()));

        match host.map(|h| Origin::new(scheme, h)) {
            Some(Ok(origin)) => origin,
            Some(Err(e)) => {
                tracing::debug!(error = %e, "unusable request host; using public origin");
                self.fallback.clone()
            }
            None => self.fallback.clone(),
        }
    }
}

/// Returns the raw forwarded host header, if present and valid text.
#[must_use]
pub fn forwarded_host(headers: &HeaderMap) -> Option<String> {
    headers
        .get(FORWARDED_HOST_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn resolver() -> RequestOriginResolver {
        RequestOriginResolver::new(
            "http",
            Origin::parse("https://jobs.example.com").expect("valid"),
        )
    }

    #[test]
    fn uses_host_header_for_relative_uri() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("localhost:3000"));
        let origin = resolver().resolve(&Uri::from_static("/auth/callback"), &headers);
        assert_eq!(origin.to_string(), "http://localhost:3000");
    }

    #[test]
    fn absolute_uri_wins_over_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("other:1"));
        let uri = Uri::from_static("https://app.internal:8443/auth/callback?code=x");
        let origin = resolver().resolve(&uri, &headers);
        assert_eq!(origin.to_string(), "https://app.internal:8443");
    }

    #[test]
    fn falls_back_without_host() {
        let origin = resolver().resolve(&Uri::from_static("/auth/callback"), &HeaderMap::new());
        assert_eq!(origin.to_string(), "https://jobs.example.com");
    }

    #[test]
    fn falls_back_on_malformed_host() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("a b"));
        let origin = resolver().resolve(&Uri::from_static("/"), &headers);
        assert_eq!(origin.to_string(), "https://jobs.example.com");
    }

    #[test]
    fn forwarded_host_reads_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(forwarded_host(&headers), None);

        headers.insert(FORWARDED_HOST_HEADER, HeaderValue::from_static("jobs.example.com"));
        assert_eq!(forwarded_host(&headers).as_deref(), Some("jobs.example.com"));
    }
}
