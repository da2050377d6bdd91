//! Single-route HTTP relay library.
//!
//! Forwards everything under `/{prefix}/` to one upstream API, removing
//! configured top-level fields from JSON request bodies and relaying
//! buffered or event-stream responses back to the caller.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod transform;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
