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
//! Wiring between configuration, logging, the scrape pipeline and the
//! HTTP endpoint
//!
//! Precedence, lowest first: built-in defaults, configuration file,
//! `REDIS_EXPORTER_*` environment variables, command-line flags.

use anyhow::{Context, Result};
use clap::Parser;
use redis_exporter_config::{Config, ConfigLoader, Validator};
use redis_exporter_metrics::{MetricsConfig, MetricsRegistry, MetricsServer, NamingPolicy, RedisExporter};
use redis_exporter_observability::{init_tracing_with_config, LogConfig, LogFormat};
use redis_exporter_scrape::{
    Connector, RedisConnector, ScrapeCoordinator, ScrapeOptions, TargetSet, Timeouts,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Command-line arguments
#[derive(Parser, Debug, Default)]
#[command(name = "redis-exporter")]
#[command(version, about = "Prometheus exporter for Redis INFO metrics")]
#[command(author = "redis-exporter Contributors")]
pub struct Args {
    /// Configuration file (toml, yaml or json)
    #[arg(short, long, value_name = "PATH", env = "REDIS_EXPORTER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address of one or more redis nodes, comma separated
    #[arg(long, value_name = "HOST:PORT[,...]")]
    pub redis_addr: Option<String>,

    /// Namespace for metrics
    #[arg(long)]
    pub namespace: Option<String>,

    /// Address to listen on for web interface and telemetry
    #[arg(long, value_name = "HOST:PORT")]
    pub web_listen_address: Option<String>,

    /// Path under which to expose metrics
    #[arg(long, value_name = "PATH")]
    pub web_telemetry_path: Option<String>,

    /// Log format (pretty, compact, json)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log level or filter directives; RUST_LOG applies when unset
    #[arg(long)]
    pub log_level: Option<String>,

    /// Skip the CONFIG GET query
    #[arg(long)]
    pub no_config_metrics: bool,
}

impl Args {
    /// Overlay the flags that were given onto `config`
    pub fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(addrs) = &self.redis_addr {
            config.redis.addrs = addrs.split(',').map(|a| a.trim().to_string()).collect();
        }
        if let Some(namespace) = &self.namespace {
            config.redis.namespace.clone_from(namespace);
        }
        if let Some(addr) = &self.web_listen_address {
            config
                .server
                .set_listen_address(addr)
                .map_err(|reason| anyhow::anyhow!("--web-listen-address: {}", reason))?;
        }
        if let Some(path) = &self.web_telemetry_path {
            config.server.metrics_path.clone_from(path);
        }
        if let Some(format) = &self.log_format {
            config.observability.log_format.clone_from(format);
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = Some(level.clone());
        }
        if self.no_config_metrics {
            config.redis.config_metrics = false;
        }
        Ok(())
    }
}

/// Resolve the effective configuration for `args`
pub async fn load_config(args: &Args) -> Result<Config> {
    load_config_with(args, |name| std::env::var(name).ok()).await
}

/// Resolve the configuration, reading environment overrides through `lookup`
pub async fn load_config_with<F>(args: &Args, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let loader = ConfigLoader::without_validation();
    let mut config = loader
        .load_with_lookup(args.config.as_deref(), lookup)
        .await
        .context("loading configuration")?;

    args.apply(&mut config)?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Logging settings derived from the configuration
pub fn log_config(config: &Config) -> Result<LogConfig> {
    let format: LogFormat = config.observability.log_format.parse()?;
    let log = LogConfig::new().with_format(format);
    Ok(match &config.observability.log_level {
        Some(level) => log.with_level(level.as_str()),
        None => log,
    })
}

/// Build an exporter that opens sessions through `connector`
pub fn build_exporter(config: &Config, connector: Arc<dyn Connector>) -> Result<RedisExporter> {
    let targets = TargetSet::new(config.redis.addrs.iter().map(String::as_str))?;

    let coordinator = ScrapeCoordinator::new(
        connector,
        ScrapeOptions {
            config_metrics: config.redis.config_metrics,
            target_deadline: config.redis.scrape_timeout(),
        },
    );

    let naming = NamingPolicy::new(config.redis.namespace.as_str()).with_renames(
        config
            .redis
            .rename
            .iter()
            .map(|(raw, to)| (raw.as_str(), to.as_str())),
    );
    let registry = MetricsRegistry::new(naming)?;

    Ok(RedisExporter::new(targets, coordinator, registry))
}

/// Settings for the HTTP endpoint
pub fn metrics_config(config: &Config) -> MetricsConfig {
    MetricsConfig {
        port: config.server.port,
        enabled: config.server.enabled,
        bind_address: config.server.host.clone(),
        path: config.server.metrics_path.clone(),
    }
}

/// Run the exporter until interrupted
pub async fn run(args: Args) -> Result<()> {
    let config = load_config(&args).await?;
    init_tracing_with_config(&log_config(&config)?)?;

    let connector = RedisConnector::new(Timeouts {
        connect: config.redis.connect_timeout(),
        command: config.redis.command_timeout(),
    });
    let exporter = build_exporter(&config, Arc::new(connector))?;

    info!(
        targets = ?config.redis.addrs,
        namespace = %config.redis.namespace,
        "Redis exporter starting"
    );

    MetricsServer::with_config(Arc::new(exporter), metrics_config(&config))
        .serve_with_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutting down"),
        Err(e) => {
            warn!(error = %e, "Cannot listen for Ctrl+C, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
