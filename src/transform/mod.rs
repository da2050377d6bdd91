//! Request/response transformation subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → headers.rs (drop host + framing headers)
//!     → body.rs (strip configured JSON fields, application/json only)
//!     → Upstream request
//!
//! Upstream response
//!     → headers.rs (drop hop-by-hop headers)
//!     → Caller
//! ```

pub mod body;
pub mod headers;

pub use body::{is_json_body, strip_fields, BodyTransformError, StrippedBody};
pub use headers::{outbound_request_headers, relayed_response_headers};
