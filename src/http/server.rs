//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router for the relay route
//! - Wire up middleware (tracing, CORS, body limit)
//! - Bind server to listener
//! - Hand requests to the forwarding pipeline
//! - Observability (metrics, request-scoped spans)

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
    routing::{on, MethodFilter},
    Router,
};
use tokio::net::TcpListener;
use tower::{service_fn, ServiceExt};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::forward::ForwardingPipeline;
use crate::http::request::{make_request_span, InboundRequest};
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ForwardingPipeline>,
    pub route_prefix: Arc<str>,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, reqwest::Error> {
        let pipeline = Arc::new(ForwardingPipeline::from_config(&config)?);

        let state = AppState {
            pipeline,
            route_prefix: Arc::from(config.listener.route_prefix.as_str()),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let prefix = &config.listener.route_prefix;

        let relay = Router::new()
            .route(&format!("/{prefix}/{{*path}}"), on(relay_methods(), proxy_handler))
            .route(&format!("/{prefix}/"), on(relay_methods(), proxy_handler))
            .with_state(state);
        let with_cors = relay.clone().layer(cors_layer());

        // CorsLayer answers every OPTIONS itself; only real preflights may stop here.
        let dispatch = service_fn(move |req: Request| {
            let router = if is_plain_options(&req) {
                relay.clone()
            } else {
                with_cors.clone()
            };
            router.oneshot(req)
        });

        Router::new()
            .fallback_service(dispatch)
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>))
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            prefix = %self.config.listener.route_prefix,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.recv())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// GET, POST, PUT, DELETE, PATCH, OPTIONS and HEAD; anything else is a 405.
fn relay_methods() -> MethodFilter {
    MethodFilter::GET
        .or(MethodFilter::POST)
        .or(MethodFilter::PUT)
        .or(MethodFilter::DELETE)
        .or(MethodFilter::PATCH)
        .or(MethodFilter::OPTIONS)
        .or(MethodFilter::HEAD)
}

/// Permissive CORS: any origin, method and header, credentials allowed.
///
/// Wildcards are not allowed together with credentials, so the request's
/// own values are mirrored back.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// An OPTIONS request that is not a CORS preflight (no `Origin` or no
/// `Access-Control-Request-Method`). These are relayed like any other verb.
fn is_plain_options(req: &Request) -> bool {
    req.method() == Method::OPTIONS
        && !(req.headers().contains_key(header::ORIGIN)
            && req
                .headers()
                .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD))
}

/// Main proxy handler.
async fn proxy_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start_time = Instant::now();
    let inbound = InboundRequest::new(method, &uri, headers, body, &state.route_prefix);
    let method_str = inbound.method.to_string();

    tracing::info!(
        method = %inbound.method,
        path = %inbound.path_remainder,
        "Received request"
    );

    match state.pipeline.forward(inbound).await {
        Ok(response) => {
            metrics::record_request(&method_str, response.status().as_u16(), response.mode(), start_time);
            response.into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Upstream error");
            metrics::record_upstream_error(e.kind());
            metrics::record_request(&method_str, e.status().as_u16(), "error", start_time);
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn server() -> HttpServer {
        let mut config = ProxyConfig::default();
        config.upstream.base_url = "http://127.0.0.1:9".into();
        config.upstream.use_system_proxy = false;
        HttpServer::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_unsupported_method_rejected() {
        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .method(Method::TRACE)
                    .uri("/hf/v1/models")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_paths_outside_prefix_not_found() {
        let response = server()
            .router()
            .oneshot(Request::builder().uri("/v1/models").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_preflight_is_answered_locally() {
        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/hf/v1/chat/completions")
                    .header("origin", "http://localhost:8000")
                    .header("access-control-request-method", "POST")
                    .header("access-control-request-headers", "content-type,authorization")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(
            headers.get("access-control-allow-origin").unwrap(),
            "http://localhost:8000"
        );
        assert_eq!(headers.get("access-control-allow-credentials").unwrap(), "true");
        assert_eq!(headers.get("access-control-allow-methods").unwrap(), "POST");
    }

    #[tokio::test]
    async fn test_plain_options_is_relayed() {
        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/hf/v1/models")
                    .header("origin", "http://localhost:8000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        // Nothing listens upstream, so reaching the handler means a gateway error.
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(response.headers().get("access-control-allow-origin").is_none());
    }

    #[test]
    fn test_preflight_detection() {
        let options = |headers: &[(&str, &str)]| {
            let mut builder = Request::builder().method(Method::OPTIONS).uri("/hf/x");
            for (name, value) in headers {
                builder = builder.header(*name, *value);
            }
            builder.body(Body::empty()).unwrap()
        };

        assert!(is_plain_options(&options(&[])));
        assert!(is_plain_options(&options(&[("origin", "http://a")])));
        assert!(is_plain_options(&options(&[("access-control-request-method", "GET")])));
        assert!(!is_plain_options(&options(&[
            ("origin", "http://a"),
            ("access-control-request-method", "GET"),
        ])));

        let get = Request::builder().uri("/hf/x").body(Body::empty()).unwrap();
        assert!(!is_plain_options(&get));
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let mut config = ProxyConfig::default();
        config.upstream.base_url = "http://127.0.0.1:9".into();
        config.upstream.use_system_proxy = false;
        config.listener.max_body_bytes = 8;
        let server = HttpServer::new(config).unwrap();

        let response = server
            .router()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/hf/v1/chat/completions")
                    .header("content-length", "32")
                    .body(Body::from(vec![b'x'; 32]))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
