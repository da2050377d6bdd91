//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (clap handles syntactic)
//! - Check the upstream base URL is an absolute http(s) URL
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Reject route prefixes that cannot be mounted
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("upstream base URL {url:?} is invalid: {reason}")]
    UpstreamUrl { url: String, reason: String },
    #[error("bind address {0:?} must be host:port")]
    BindAddress(String),
    #[error("metrics address {0:?} is not a socket address")]
    MetricsAddress(String),
    #[error("route prefix {0:?} must be a single segment of letters, digits, '-', '.', '_' or '~'")]
    RoutePrefix(String),
    #[error("strip field names must be non-empty")]
    EmptyStripField,
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(reason) = check_upstream_url(&config.upstream.base_url) {
        errors.push(ValidationError::UpstreamUrl {
            url: config.upstream.base_url.clone(),
            reason,
        });
    }

    if !is_host_port(&config.listener.bind_address) {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::MetricsAddress(addr.clone()));
        }
    }

    let prefix = &config.listener.route_prefix;
    if !is_route_segment(prefix) {
        errors.push(ValidationError::RoutePrefix(prefix.clone()));
    }

    if config.transform.strip_fields.iter().any(|f| f.is_empty()) {
        errors.push(ValidationError::EmptyStripField);
    }

    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::Zero("max_body_bytes"));
    }
    if config.upstream.timeout_secs == Some(0) {
        errors.push(ValidationError::Zero("upstream timeout"));
    }
    if config.upstream.connect_timeout_secs == Some(0) {
        errors.push(ValidationError::Zero("connect timeout"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `host:port` with a numeric port; the host may be a name, resolved at bind time.
fn is_host_port(raw: &str) -> bool {
    if raw.parse::<SocketAddr>().is_ok() {
        return true;
    }
    match raw.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && !host.contains(':') && port.parse::<u16>().is_ok(),
        None => false,
    }
}

/// Unreserved URL characters only, so the prefix is a literal router segment.
fn is_route_segment(prefix: &str) -> bool {
    !prefix.is_empty()
        && prefix != "."
        && prefix != ".."
        && prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~'))
}

fn check_upstream_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme {other:?}")),
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("must not carry a query or fragment".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&ProxyConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ProxyConfig::default();
        config.upstream.base_url = "not a url".into();
        config.listener.route_prefix = ":v1".into();
        config.listener.max_body_bytes = 0;
        config.upstream.timeout_secs = Some(0);
        config.transform.strip_fields = vec!["".into()];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::RoutePrefix(":v1".into())));
        assert!(errors.contains(&ValidationError::EmptyStripField));
    }

    #[test]
    fn test_route_prefix_rules() {
        for ok in ["hf", "v1", "open-ai", "a.b_c~d"] {
            assert!(is_route_segment(ok), "{ok} should be accepted");
        }
        for bad in ["", "a/b", ":v1", "*rest", "{x}", "{*path}", "a b", "..", "%41"] {
            assert!(!is_route_segment(bad), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_bind_address_rules() {
        assert!(is_host_port("0.0.0.0:8000"));
        assert!(is_host_port("[::1]:8000"));
        assert!(is_host_port("localhost:8000"));
        assert!(!is_host_port("localhost"));
        assert!(!is_host_port(":8000"));
        assert!(!is_host_port("localhost:http"));
    }

    #[test]
    fn test_upstream_url_rules() {
        assert!(check_upstream_url("https://api.example.com/v2").is_ok());
        assert!(check_upstream_url("http://127.0.0.1:8080").is_ok());
        assert!(check_upstream_url("ws://example.com").is_err());
        assert!(check_upstream_url("https://example.com/?key=1").is_err());
        assert!(check_upstream_url("example.com").is_err());
    }

    #[test]
    fn test_metrics_address_checked_only_when_set() {
        let mut config = ProxyConfig::default();
        config.observability.metrics_address = Some("0.0.0.0:9090".into());
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_address = Some("localhost".into());
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::MetricsAddress("localhost".into())])
        );
    }
}
