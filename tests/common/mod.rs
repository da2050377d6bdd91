//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, Uri};
use axum::response::Response;
use axum::Router;
use hf_relay::config::ProxyConfig;
use hf_relay::http::HttpServer;
use hf_relay::lifecycle::Shutdown;
use tokio::net::TcpListener;

/// A request as seen by the mock upstream.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Captured {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Requests recorded by a mock upstream, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    requests: Arc<Mutex<Vec<Captured>>>,
}

#[allow(dead_code)]
impl Recorder {
    pub fn requests(&self) -> Vec<Captured> {
        self.requests.lock().unwrap().clone()
    }

    pub fn only(&self) -> Captured {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one upstream request");
        requests.into_iter().next().unwrap()
    }
}

/// Serve `router` on an ephemeral local port.
pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Start a mock upstream that records every request and answers with `respond`.
pub async fn start_recording_upstream<F>(respond: F) -> (SocketAddr, Recorder)
where
    F: Fn(&Captured) -> Response + Send + Sync + 'static,
{
    let recorder = Recorder::default();
    let respond = Arc::new(respond);

    let rec = recorder.clone();
    let router = Router::new().fallback(
        move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| {
            let rec = rec.clone();
            let respond = respond.clone();
            async move {
                let captured = Captured {
                    method,
                    uri,
                    headers,
                    body,
                };
                let response = respond(&captured);
                rec.requests.lock().unwrap().push(captured);
                response
            }
        },
    );

    (serve(router).await, recorder)
}

/// An address nothing is listening on.
#[allow(dead_code)]
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Relay configuration pointed at `upstream_base`, isolated from system proxies.
pub fn proxy_config(upstream_base: &str) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.upstream.base_url = upstream_base.to_string();
    config.upstream.use_system_proxy = false;
    config
}

/// Start the relay with `config`; returns its address and shutdown handle.
pub async fn start_proxy(config: ProxyConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let signal = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, signal).await;
    });

    (addr, shutdown)
}

/// Test client that never goes through a system proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
