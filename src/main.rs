//! hf-relay
//!
//! A single-route relay built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌───────────────────────────────────────────────┐
//!                       │                    RELAY                      │
//!   Client Request      │  ┌─────────┐   ┌───────────┐   ┌───────────┐  │
//!   ────────────────────┼─▶│  axum   │──▶│ transform │──▶│  reqwest  │──┼──▶ Upstream
//!   /hf/{path}          │  │ router  │   │host, JSON │   │  client   │  │    {BASE}/{path}
//!                       │  └─────────┘   └───────────┘   └─────┬─────┘  │
//!                       │                                      │        │
//!   Client Response     │  ┌──────────────────────────────┐    │        │
//!   ◀───────────────────┼──│ Buffered  |  Streamed (SSE)  │◀───┘        │
//!                       │  └──────────────────────────────┘             │
//!                       └───────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;

use hf_relay::config::{load_config, ConfigError};
use hf_relay::http::HttpServer;
use hf_relay::lifecycle::{wait_for_signal, Shutdown};
use hf_relay::observability::{logging, metrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match load_config() {
        Ok(config) => config,
        Err(ConfigError::Args(e)) => e.exit(),
        Err(e) => {
            eprintln!("hf-relay: {e}");
            std::process::exit(2);
        }
    };

    logging::init_logging(config.observability.log_format);

    tracing::info!("hf-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        strip_fields = ?config.transform.strip_fields,
        upstream_timeout_secs = ?config.upstream.timeout_secs,
        "Configuration loaded"
    );
    let effective = serde_json::to_string(&config)?;
    tracing::debug!(config = %effective, "Effective configuration");

    if config.upstream.base_url.ends_with('/') {
        tracing::warn!(
            upstream = %config.upstream.base_url,
            "Upstream URL ends with '/'; forwarded paths will contain '//'"
        );
    }

    if let Some(addr) = &config.observability.metrics_address {
        let addr: SocketAddr = addr.parse()?;
        if let Err(e) = metrics::init_metrics(addr) {
            tracing::error!(error = %e, "Failed to start metrics exporter");
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let grace = Duration::from_secs(config.lifecycle.shutdown_grace_secs);
    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        res = &mut server_task => {
            res??;
            return Ok(());
        }
        _ = wait_for_signal() => {}
    }

    shutdown.trigger();
    match tokio::time::timeout(grace, server_task).await {
        Ok(res) => res??,
        Err(_) => tracing::warn!(
            grace_secs = grace.as_secs(),
            "Grace period elapsed with responses still in flight"
        ),
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
