//! Response handling and transformation.
//!
//! # Responsibilities
//! - Decide between buffered and streamed relay from the upstream content type
//! - Hold the relayed status, headers and body in one two-variant type
//! - Write either variant back to the caller
//!
//! # Design Decisions
//! - Streaming responses are never buffered; chunks are copied as they arrive
//! - The decision is made once, from the upstream `Content-Type` alone
//! - Errors after headers are sent end the stream; they are logged

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::stream::BoxStream;
use futures_util::TryStreamExt;

/// Content type that selects streamed relay (exact match).
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

/// Chunks read from the upstream body, in order.
pub type ChunkStream = BoxStream<'static, Result<Bytes, reqwest::Error>>;

/// Returns true when the upstream declared exactly `text/event-stream`.
pub fn is_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .is_some_and(|v| v.as_bytes() == EVENT_STREAM_CONTENT_TYPE.as_bytes())
}

/// What the caller receives for a successfully relayed request.
pub enum ProxyResponse {
    /// Body fully read from the upstream.
    Buffered {
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    },
    /// Body copied chunk by chunk while the upstream produces it.
    Streamed {
        status: StatusCode,
        headers: HeaderMap,
        chunks: ChunkStream,
    },
}

impl ProxyResponse {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyResponse::Buffered { status, .. } | ProxyResponse::Streamed { status, .. } => *status,
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        match self {
            ProxyResponse::Buffered { headers, .. } | ProxyResponse::Streamed { headers, .. } => headers,
        }
    }

    /// Relay mode label for logs and metrics.
    pub fn mode(&self) -> &'static str {
        match self {
            ProxyResponse::Buffered { .. } => "buffered",
            ProxyResponse::Streamed { .. } => "streamed",
        }
    }
}

impl std::fmt::Debug for ProxyResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProxyResponse::Buffered { status, headers, body } => f
                .debug_struct("Buffered")
                .field("status", status)
                .field("headers", headers)
                .field("body_len", &body.len())
                .finish(),
            ProxyResponse::Streamed { status, headers, .. } => f
                .debug_struct("Streamed")
                .field("status", status)
                .field("headers", headers)
                .finish_non_exhaustive(),
        }
    }
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let (status, headers, body) = match self {
            ProxyResponse::Buffered { status, headers, body } => (status, headers, Body::from(body)),
            ProxyResponse::Streamed { status, headers, chunks } => {
                let chunks = chunks.inspect_err(|e| {
                    tracing::warn!(error = %e, "Upstream stream ended with an error");
                });
                (status, headers, Body::from_stream(chunks))
            }
        };

        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}
