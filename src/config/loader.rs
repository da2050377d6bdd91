//! Configuration loading from the environment.
//!
//! Every setting is read from an environment variable; the same setting is
//! also accepted as a long flag so a deployment can override it inline.

use clap::Parser;

use crate::config::schema::{
    LogFormat, ProxyConfig, DEFAULT_ROUTE_PREFIX, DEFAULT_STRIP_FIELD, DEFAULT_UPSTREAM_URL,
};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid arguments: {0}")]
    Args(#[from] clap::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Command-line / environment surface of the relay.
#[derive(Debug, Parser)]
#[command(name = "hf-relay")]
#[command(about = "Relays /hf/* to an upstream API, stripping unsupported JSON fields", long_about = None)]
pub struct Cli {
    /// Upstream API base URL.
    #[arg(long, env = "THIRD_PARTY_API_URL", default_value = DEFAULT_UPSTREAM_URL)]
    pub upstream_url: String,

    /// Address to listen on, as host:port (the host may be a name).
    #[arg(long, env = "PROXY_BIND_ADDRESS", default_value = "0.0.0.0:8000")]
    pub bind_address: String,

    /// Route prefix: one path segment of letters, digits, '-', '.', '_' or '~'.
    #[arg(long, env = "PROXY_ROUTE_PREFIX", default_value = DEFAULT_ROUTE_PREFIX)]
    pub route_prefix: String,

    /// Top-level JSON fields to remove from request bodies.
    #[arg(
        long,
        env = "PROXY_STRIP_FIELDS",
        value_delimiter = ',',
        default_value = DEFAULT_STRIP_FIELD
    )]
    pub strip_fields: Vec<String>,

    /// Upstream request timeout in seconds (unset: no timeout).
    #[arg(long, env = "PROXY_UPSTREAM_TIMEOUT_SECS")]
    pub upstream_timeout_secs: Option<u64>,

    /// Upstream connect timeout in seconds.
    #[arg(long, env = "PROXY_CONNECT_TIMEOUT_SECS")]
    pub connect_timeout_secs: Option<u64>,

    /// Honor HTTP_PROXY/HTTPS_PROXY for upstream calls.
    #[arg(
        long,
        env = "PROXY_USE_SYSTEM_PROXY",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub use_system_proxy: bool,

    /// Maximum inbound request body in bytes.
    #[arg(long, env = "PROXY_MAX_BODY_BYTES", default_value_t = 32 * 1024 * 1024)]
    pub max_body_bytes: usize,

    /// Seconds to wait for in-flight responses on shutdown.
    #[arg(long, env = "PROXY_SHUTDOWN_GRACE_SECS", default_value_t = 30)]
    pub shutdown_grace_secs: u64,

    /// Log output format.
    #[arg(long, env = "PROXY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Prometheus metrics listen address (unset: disabled).
    #[arg(long, env = "PROXY_METRICS_ADDRESS")]
    pub metrics_address: Option<String>,
}

impl From<Cli> for ProxyConfig {
    fn from(cli: Cli) -> Self {
        let mut config = ProxyConfig::default();

        config.listener.bind_address = cli.bind_address;
        config.listener.route_prefix = cli.route_prefix;
        config.listener.max_body_bytes = cli.max_body_bytes;

        config.upstream.base_url = cli.upstream_url;
        config.upstream.timeout_secs = cli.upstream_timeout_secs;
        config.upstream.connect_timeout_secs = cli.connect_timeout_secs;
        config.upstream.use_system_proxy = cli.use_system_proxy;

        config.transform.strip_fields = cli
            .strip_fields
            .into_iter()
            .map(|f| f.trim().to_string())
            .collect();

        config.observability.log_format = cli.log_format;
        config.observability.metrics_address = cli.metrics_address;

        config.lifecycle.shutdown_grace_secs = cli.shutdown_grace_secs;
        config
    }
}

/// Load and validate configuration from the process environment and arguments.
pub fn load_config() -> Result<ProxyConfig, ConfigError> {
    load_config_from(std::env::args_os())
}

/// Load and validate configuration from an explicit argument list.
pub fn load_config_from<I, T>(args: I) -> Result<ProxyConfig, ConfigError>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::try_parse_from(args)?;
    let config = ProxyConfig::from(cli);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
