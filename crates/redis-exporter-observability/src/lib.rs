//! Redis exporter observability
//!
//! Structured logging setup shared by the exporter crates. Library crates only
//! emit `tracing` events; the binary decides where and how they are written.
//!
//! # Example
//!
//! ```ignore
//! use redis_exporter_observability::{init_tracing, LogFormat};
//!
//! init_tracing(LogFormat::Compact, None)?;
//! tracing::info!(targets = 2, "starting exporter");
//! ```

pub mod config;
pub mod initialization;

pub use config::{LogConfig, LogError, LogFormat, LogOutput};
pub use initialization::{init_tracing, init_tracing_with_config};
