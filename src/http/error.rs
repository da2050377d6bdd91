//! Proxy-level failures and their mapping to HTTP responses.
//!
//! Upstream non-2xx statuses are NOT errors; they are relayed as-is. Only
//! failures that leave the relay without an upstream response end up here.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors produced while forwarding a single request.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The upstream could not be reached (refused, DNS, TLS handshake).
    #[error("failed to connect to upstream: {0}")]
    Connect(#[source] reqwest::Error),

    /// No response (or buffered body) within the configured deadline.
    #[error("upstream request timed out")]
    Timeout,

    /// The composed upstream URL is not a valid URL.
    #[error("invalid upstream URL {url:?}: {source}")]
    InvalidTarget {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The upstream request could not be built from the inbound one.
    #[error("failed to build upstream request: {0}")]
    Request(#[source] reqwest::Error),

    /// Transport failure after the connection was established.
    #[error("upstream request failed: {0}")]
    Upstream(#[source] reqwest::Error),
}

impl ProxyError {
    /// Classify a transport error from the HTTP client.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProxyError::Timeout
        } else if err.is_connect() {
            ProxyError::Connect(err)
        } else if err.is_builder() {
            ProxyError::Request(err)
        } else {
            ProxyError::Upstream(err)
        }
    }

    /// Status code returned to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::InvalidTarget { .. } => StatusCode::BAD_REQUEST,
            ProxyError::Connect(_) | ProxyError::Request(_) | ProxyError::Upstream(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::Connect(_) => "connect",
            ProxyError::Timeout => "timeout",
            ProxyError::InvalidTarget { .. } => "invalid_target",
            ProxyError::Request(_) => "request",
            ProxyError::Upstream(_) => "upstream",
        }
    }

    fn public_message(&self) -> &'static str {
        match self {
            ProxyError::Connect(_) => "Upstream unreachable",
            ProxyError::Timeout => "Upstream request timed out",
            ProxyError::InvalidTarget { .. } => "Invalid upstream path",
            ProxyError::Request(_) | ProxyError::Upstream(_) => "Upstream request failed",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), self.public_message()).into_response()
    }
}
