//! Upstream HTTP client.
//!
//! One pooled `reqwest::Client` per process. A single attempt is made per
//! inbound request; there is no retry path.

use std::future::Future;
use std::time::Duration;

use futures_util::StreamExt;

use crate::config::UpstreamConfig;
use crate::http::error::ProxyError;
use crate::http::request::UpstreamRequest;
use crate::http::response::{is_event_stream, ProxyResponse};
use crate::transform;

/// Longest slice of a buffered body echoed into debug logs.
const LOGGED_BODY_LIMIT: usize = 4096;

/// Dispatches prepared requests to the upstream API.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    inner: reqwest::Client,
    timeout: Option<Duration>,
}

impl UpstreamClient {
    /// Build the client from upstream settings.
    ///
    /// The request timeout covers the wait for response headers and, for
    /// buffered responses, the body. Streamed bodies are never cut off.
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.connect_timeout_secs {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }

        Ok(Self {
            inner: builder.build()?,
            timeout: config.timeout_secs.map(Duration::from_secs),
        })
    }

    /// Send `request` and classify the response as streamed or buffered.
    pub async fn dispatch(&self, request: UpstreamRequest) -> Result<ProxyResponse, ProxyError> {
        let send = self
            .inner
            .request(request.method, request.url)
            .headers(request.headers)
            .body(request.body)
            .send();

        let response = self.with_deadline(send).await?;
        let status = response.status();

        if is_event_stream(response.headers()) {
            let headers = transform::relayed_response_headers(response.headers(), true);
            tracing::debug!(status = %status, "Relaying event stream");
            return Ok(ProxyResponse::Streamed {
                status,
                headers,
                chunks: response.bytes_stream().boxed(),
            });
        }

        let headers = transform::relayed_response_headers(response.headers(), false);
        let body = self.with_deadline(response.bytes()).await?;

        tracing::debug!(
            status = %status,
            bytes = body.len(),
            content = %String::from_utf8_lossy(&body[..body.len().min(LOGGED_BODY_LIMIT)]),
            "Upstream response"
        );

        Ok(ProxyResponse::Buffered {
            status,
            headers,
            body,
        })
    }

    async fn with_deadline<T, F>(&self, fut: F) -> Result<T, ProxyError>
    where
        F: Future<Output = Result<T, reqwest::Error>>,
    {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| ProxyError::Timeout)?
                .map_err(ProxyError::from_transport),
            None => fut.await.map_err(ProxyError::from_transport),
        }
    }
}
