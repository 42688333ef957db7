//! Redis Exporter Metrics
//!
//! Prometheus registry and HTTP endpoint fed by the scrape pipeline.
//!
//! # Features
//!
//! - **Lazy registration**: one gauge per exported name, created on first sight
//! - **Naming policy**: built-in and configured renames, namespace prefix
//! - **Pull-driven**: every request to the telemetry path runs one scrape cycle
//! - **Self-metrics**: scrape count, last cycle duration, last cycle error
//!
//! # Example
//!
//! ```ignore
//! use redis_exporter_metrics::{MetricsConfig, MetricsRegistry, MetricsServer, NamingPolicy, RedisExporter};
//! use redis_exporter_scrape::{RedisConnector, ScrapeCoordinator, ScrapeOptions, TargetSet, Timeouts};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let exporter = RedisExporter::new(
//!         TargetSet::parse_list("localhost:6379", ',')?,
//!         ScrapeCoordinator::new(Arc::new(RedisConnector::new(Timeouts::default())), ScrapeOptions::default()),
//!         MetricsRegistry::new(NamingPolicy::new("redis"))?,
//!     );
//!
//!     MetricsServer::with_config(Arc::new(exporter), MetricsConfig::default())
//!         .serve()
//!         .await
//! }
//! ```

pub mod exporter;
pub mod names;
pub mod registry;
pub mod server;
pub mod types;

pub use exporter::RedisExporter;
pub use names::{ExportedName, NamingPolicy};
pub use registry::{MetricsRegistry, RegistryError, RegistryResult};
pub use server::MetricsServer;
pub use types::MetricsConfig;

// Re-export prometheus types for convenience
pub use prometheus::{Encoder, TextEncoder};
