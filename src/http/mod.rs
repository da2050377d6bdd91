//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, CORS, body limit, request span)
//!     → request.rs (path remainder, upstream URL, header/body preparation)
//!     → forward.rs (pipeline: prepare → dispatch)
//!     → client.rs (single upstream attempt)
//!     → response.rs (buffered or streamed relay)
//!     → Send to client
//! ```

pub mod client;
pub mod error;
pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use client::UpstreamClient;
pub use error::ProxyError;
pub use forward::ForwardingPipeline;
pub use request::{InboundRequest, UpstreamRequest, UpstreamTarget};
pub use response::ProxyResponse;
pub use server::{AppState, HttpServer};
