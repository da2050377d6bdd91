//! The forwarding pipeline.
//!
//! ```text
//! InboundRequest
//!     → UpstreamRequest::prepare (drop host, strip JSON fields, compose URL)
//!     → UpstreamClient::dispatch (single attempt)
//!     → ProxyResponse::{Buffered, Streamed}
//! ```

use crate::config::ProxyConfig;
use crate::http::client::UpstreamClient;
use crate::http::error::ProxyError;
use crate::http::request::{InboundRequest, UpstreamRequest, UpstreamTarget};
use crate::http::response::ProxyResponse;

/// Stateless per-request pipeline over immutable startup configuration.
#[derive(Debug, Clone)]
pub struct ForwardingPipeline {
    target: UpstreamTarget,
    strip_fields: Vec<String>,
    client: UpstreamClient,
}

impl ForwardingPipeline {
    pub fn new(target: UpstreamTarget, strip_fields: Vec<String>, client: UpstreamClient) -> Self {
        Self {
            target,
            strip_fields,
            client,
        }
    }

    /// Build the pipeline from a validated configuration.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            UpstreamTarget::new(config.upstream.base_url.clone()),
            config.transform.strip_fields.clone(),
            UpstreamClient::new(&config.upstream)?,
        ))
    }

    pub fn target(&self) -> &UpstreamTarget {
        &self.target
    }

    /// Forward one inbound request and return the relayed response.
    pub async fn forward(&self, inbound: InboundRequest) -> Result<ProxyResponse, ProxyError> {
        let request = UpstreamRequest::prepare(inbound, &self.target, &self.strip_fields)?;

        tracing::info!(
            method = %request.method,
            url = %request.url,
            "Forwarding to upstream"
        );

        self.client.dispatch(request).await
    }
}
