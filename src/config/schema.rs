//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive `Serialize` so the effective configuration can be logged
//! at startup.

use serde::Serialize;

/// Default upstream used when `THIRD_PARTY_API_URL` is not set.
pub const DEFAULT_UPSTREAM_URL: &str = "https://default-api.com";

/// Default route prefix (`/hf/...`).
pub const DEFAULT_ROUTE_PREFIX: &str = "hf";

/// Field removed from JSON request bodies unless configured otherwise.
pub const DEFAULT_STRIP_FIELD: &str = "frequency_penalty";

/// Root configuration for the relay.
#[derive(Debug, Clone, Serialize, Default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Upstream target and client settings.
    pub upstream: UpstreamConfig,

    /// Request body transformation.
    pub transform: TransformConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Process lifecycle settings.
    pub lifecycle: LifecycleConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,

    /// Route prefix without slashes; requests under `/{route_prefix}/` are relayed.
    pub route_prefix: String,

    /// Maximum inbound request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
            route_prefix: DEFAULT_ROUTE_PREFIX.to_string(),
            max_body_bytes: 32 * 1024 * 1024, // 32MB
        }
    }
}

/// Upstream API configuration.
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamConfig {
    /// Base URL; the path remainder is appended after a literal `/`.
    pub base_url: String,

    /// Total time allowed for the upstream round trip. `None` waits forever.
    pub timeout_secs: Option<u64>,

    /// Time allowed to establish the upstream connection.
    pub connect_timeout_secs: Option<u64>,

    /// Honor `HTTP_PROXY` / `HTTPS_PROXY` / `NO_PROXY` from the environment.
    pub use_system_proxy: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_UPSTREAM_URL.to_string(),
            timeout_secs: None,
            connect_timeout_secs: None,
            use_system_proxy: true,
        }
    }
}

/// JSON body transformation settings.
#[derive(Debug, Clone, Serialize)]
pub struct TransformConfig {
    /// Top-level keys removed from `application/json` request bodies.
    pub strip_fields: Vec<String>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            strip_fields: vec![DEFAULT_STRIP_FIELD.to_string()],
        }
    }
}

/// Output format for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, for development.
    #[default]
    Pretty,
    /// One JSON object per line, for log aggregation.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Default)]
pub struct ObservabilityConfig {
    /// Log output format.
    pub log_format: LogFormat,

    /// Prometheus endpoint bind address. Metrics are disabled when unset.
    pub metrics_address: Option<String>,
}

/// Startup/shutdown configuration.
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleConfig {
    /// How long in-flight responses may run after a shutdown signal.
    pub shutdown_grace_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            shutdown_grace_secs: 30,
        }
    }
}
