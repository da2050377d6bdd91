//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! environment variables / long flags
//!     → loader.rs (clap parse)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → shared via Arc to the request pipeline
//! ```
//!
//! # Design Decisions
//! - Config is resolved once at startup; handlers never read the environment
//! - All fields have defaults so the relay runs with no configuration at all
//! - Validation separates syntactic (clap) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_from, ConfigError};
pub use schema::ProxyConfig;
pub use schema::{ListenerConfig, LogFormat, TransformConfig, UpstreamConfig};
