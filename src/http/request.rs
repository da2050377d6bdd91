//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a unique request ID for the tracing span
//! - Extract the path remainder below the route prefix
//! - Compose the upstream URL from the configured base
//! - Prepare the request for forwarding (header + body normalization)
//!
//! # Design Decisions
//! - Request ID lives only in the span; it is never added to forwarded headers
//! - The remainder is taken from the raw path, so percent-encoding is preserved
//! - The raw query string is forwarded verbatim (order and repeats kept)

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, Request, Uri};
use tracing::Span;
use url::Url;
use uuid::Uuid;

use crate::http::error::ProxyError;
use crate::observability::metrics;
use crate::transform::{self, BodyTransformError};

/// Span factory for the trace layer: one span per request, keyed by a UUID v4.
pub fn make_request_span<B>(request: &Request<B>) -> Span {
    let request_id = Uuid::new_v4();
    tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri(),
    )
}

/// Everything after `/{prefix}/` in `path`, still percent-encoded.
pub fn path_remainder<'a>(path: &'a str, prefix: &str) -> &'a str {
    path.strip_prefix('/')
        .and_then(|p| p.strip_prefix(prefix))
        .and_then(|p| p.strip_prefix('/'))
        .unwrap_or("")
}

/// The request as received from the caller.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub path_remainder: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl InboundRequest {
    pub fn new(method: Method, uri: &Uri, headers: HeaderMap, body: Bytes, prefix: &str) -> Self {
        Self {
            method,
            path_remainder: path_remainder(uri.path(), prefix).to_string(),
            query: uri.query().map(str::to_string),
            headers,
            body,
        }
    }
}

/// The configured upstream base, fixed for the process lifetime.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    base_url: String,
}

impl UpstreamTarget {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `{base}/{remainder}` plus the untouched query string.
    pub fn url_for(&self, remainder: &str, query: Option<&str>) -> Result<Url, ProxyError> {
        let mut raw = format!("{}/{}", self.base_url, remainder);
        if let Some(query) = query {
            raw.push('?');
            raw.push_str(query);
        }

        Url::parse(&raw).map_err(|source| ProxyError::InvalidTarget { url: raw, source })
    }
}

/// A request ready to be dispatched upstream.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UpstreamRequest {
    /// Derive the upstream request from the inbound one.
    ///
    /// `host` is always removed. JSON bodies have `strip_fields` removed; a
    /// body that does not parse is forwarded byte-for-byte.
    pub fn prepare(
        inbound: InboundRequest,
        target: &UpstreamTarget,
        strip_fields: &[String],
    ) -> Result<Self, ProxyError> {
        let url = target.url_for(&inbound.path_remainder, inbound.query.as_deref())?;
        let headers = transform::outbound_request_headers(&inbound.headers);

        let body = if transform::is_json_body(&inbound.headers) {
            rewrite_json_body(inbound.body, strip_fields)
        } else {
            inbound.body
        };

        Ok(Self {
            method: inbound.method,
            url,
            headers,
            body,
        })
    }
}

fn rewrite_json_body(original: Bytes, strip_fields: &[String]) -> Bytes {
    match transform::strip_fields(&original, strip_fields) {
        Ok(stripped) => {
            for field in &stripped.removed {
                tracing::debug!(field = %field, "Removed field from request body");
                metrics::record_stripped_field(field);
            }
            stripped.bytes
        }
        Err(BodyTransformError::Parse(e)) => {
            tracing::debug!(error = %e, "Body is not valid JSON, forwarding unchanged");
            original
        }
        Err(e @ BodyTransformError::Encode(_)) => {
            tracing::warn!(error = %e, "Forwarding original body");
            original
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};

    fn strip() -> Vec<String> {
        vec!["frequency_penalty".to_string()]
    }

    fn inbound(method: Method, uri: &str, content_type: Option<&'static str>, body: &'static [u8]) -> InboundRequest {
        let uri: Uri = uri.parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("localhost:8000"));
        if let Some(ct) = content_type {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(ct));
        }
        InboundRequest::new(method, &uri, headers, Bytes::from_static(body), "hf")
    }

    #[test]
    fn test_path_remainder() {
        assert_eq!(path_remainder("/hf/v1/chat/completions", "hf"), "v1/chat/completions");
        assert_eq!(path_remainder("/hf/", "hf"), "");
        assert_eq!(path_remainder("/hf/a%20b/c", "hf"), "a%20b/c");
        assert_eq!(path_remainder("/hf//double", "hf"), "/double");
    }

    #[test]
    fn test_url_concatenation_is_literal() {
        let target = UpstreamTarget::new("https://api.example.com/base");
        let url = target.url_for("v1/models", None).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/base/v1/models");

        let url = target.url_for("v1/models", Some("a=1&b=2&a=3")).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/base/v1/models?a=1&b=2&a=3");
    }

    #[test]
    fn test_prepare_strips_field_and_host() {
        let req = inbound(
            Method::POST,
            "/hf/v1/chat/completions",
            Some("application/json"),
            br#"{"model":"x","frequency_penalty":0.5,"temperature":0.7}"#,
        );
        let target = UpstreamTarget::new("http://upstream.test");
        let out = UpstreamRequest::prepare(req, &target, &strip()).unwrap();

        assert_eq!(out.method, Method::POST);
        assert_eq!(out.url.as_str(), "http://upstream.test/v1/chat/completions");
        assert!(out.headers.get(header::HOST).is_none());
        assert_eq!(&out.body[..], br#"{"model":"x","temperature":0.7}"#);
    }

    #[test]
    fn test_prepare_forwards_invalid_json_unchanged() {
        let body: &'static [u8] = b"{\"frequency_penalty\": 1,";
        let req = inbound(Method::POST, "/hf/v1/x", Some("application/json"), body);
        let out = UpstreamRequest::prepare(req, &UpstreamTarget::new("http://u.test"), &strip()).unwrap();

        assert_eq!(&out.body[..], body);
    }

    #[test]
    fn test_prepare_ignores_other_content_types() {
        let body: &'static [u8] = br#"{"frequency_penalty": 1}"#;
        let req = inbound(Method::PUT, "/hf/v1/x", Some("text/plain"), body);
        let out = UpstreamRequest::prepare(req, &UpstreamTarget::new("http://u.test"), &strip()).unwrap();
        assert_eq!(&out.body[..], body);

        let req = inbound(Method::PUT, "/hf/v1/x", None, body);
        let out = UpstreamRequest::prepare(req, &UpstreamTarget::new("http://u.test"), &strip()).unwrap();
        assert_eq!(&out.body[..], body);
    }
}
