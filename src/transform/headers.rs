//! Header normalization between caller, relay and upstream.
//!
//! # Responsibilities
//! - Drop `host` before dispatch so the client targets the upstream authority
//! - Drop framing headers the HTTP client recomputes for the body it sends
//! - Strip hop-by-hop headers from upstream responses
//!
//! Header names are compared case-insensitively (`HeaderName` is lowercase).

use axum::http::{header, HeaderMap};

/// Request headers never forwarded to the upstream.
///
/// `host` is the only semantic removal. The framing headers are recomputed
/// for the (possibly rewritten) body, and the hop-by-hop ones belong to the
/// caller's connection, not the upstream one.
const REQUEST_DROPPED: &[&str] = &[
    "host",
    "content-length",
    "transfer-encoding",
    "connection",
    "keep-alive",
];

/// Hop-by-hop response headers owned by the relay's own connection.
const RESPONSE_HOP_BY_HOP: &[&str] = &["connection", "keep-alive", "transfer-encoding"];

/// Build the header set sent upstream from the inbound headers.
///
/// Repeated values are kept in order.
pub fn outbound_request_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut headers = inbound.clone();
    for name in REQUEST_DROPPED {
        headers.remove(*name);
    }
    headers
}

/// Build the header set relayed to the caller from an upstream response.
///
/// `content-length` is dropped as well when the body is re-chunked.
pub fn relayed_response_headers(upstream: &HeaderMap, streamed: bool) -> HeaderMap {
    let mut headers = upstream.clone();
    for name in RESPONSE_HOP_BY_HOP {
        headers.remove(*name);
    }
    if streamed {
        headers.remove(header::CONTENT_LENGTH);
    }
    headers
}
