// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! HTTP server for the Prometheus scrape endpoint
//!
//! Every request to the telemetry path runs one scrape cycle against the
//! configured targets and then encodes the registry.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use prometheus::{Encoder, TextEncoder};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::{exporter::RedisExporter, types::MetricsConfig};

/// HTTP server exposing the exporter
#[derive(Clone)]
pub struct MetricsServer {
    exporter: Arc<RedisExporter>,
    config: MetricsConfig,
}

impl MetricsServer {
    /// Create a new metrics server with custom configuration
    pub fn with_config(exporter: Arc<RedisExporter>, config: MetricsConfig) -> Self {
        Self { exporter, config }
    }

    /// Get the bind address for the server
    pub fn bind_address(&self) -> String {
        self.config.socket_addr()
    }

    /// Router with the telemetry and `/health` routes
    pub fn router(&self) -> Router {
        Router::new()
            .route(&self.config.path, get(metrics_handler))
            .route("/health", get(health_handler))
            .with_state(Arc::clone(&self.exporter))
    }

    /// Serve until the process ends
    pub async fn serve(self) -> anyhow::Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Serve until `shutdown` resolves
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if !self.config.enabled {
            info!("Metrics server disabled");
            return Ok(());
        }

        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(&addr).await?;
        info!(
            "Listening on http://{}{}",
            listener.local_addr()?,
            self.config.path
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow::anyhow!("Metrics server error: {}", e))
    }
}

async fn metrics_handler(State(exporter): State<Arc<RedisExporter>>) -> Response {
    let report = exporter.scrape_cycle().await;
    debug!(failed = report.failed.len(), "Serving metrics");

    let metric_families = exporter.registry().registry().gather();
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", encoder.format_type())],
            buffer,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
                .into_response()
        }
    }
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
