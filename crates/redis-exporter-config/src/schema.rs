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
//! Configuration schema and defaults

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Top-level configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Targets and naming
    pub redis: RedisConfig,

    /// HTTP endpoint
    pub server: ServerConfig,

    /// Logging
    pub observability: ObservabilityConfig,
}

/// What to scrape and how to name it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RedisConfig {
    /// `host:port` of every target
    #[serde(default = "default_addrs")]
    pub addrs: Vec<String>,

    /// Prefix for every exported metric
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Extra `raw field -> exported name` renames, layered over the built-in ones
    #[serde(default)]
    pub rename: HashMap<String, String>,

    /// Connection deadline (in milliseconds)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Per-command deadline (in milliseconds)
    #[serde(default = "default_command_timeout")]
    pub command_timeout_ms: u64,

    /// Upper bound for everything one target does in a cycle (in milliseconds)
    #[serde(default = "default_scrape_timeout")]
    pub scrape_timeout_ms: u64,

    /// Also export `CONFIG GET maxmemory`
    #[serde(default = "default_true")]
    pub config_metrics: bool,
}

impl RedisConfig {
    /// Connection deadline
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Per-command deadline
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// Per-target deadline for a whole cycle
    pub fn scrape_timeout(&self) -> Duration {
        Duration::from_millis(self.scrape_timeout_ms)
    }
}

/// HTTP endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Host to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path the exposition is served on
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,

    /// Serve the endpoint at all
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl ServerConfig {
    /// `host:port` to bind
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Set host and port from a `host:port` string; an empty host keeps the current one
    pub fn set_listen_address(&mut self, addr: &str) -> Result<(), String> {
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| format!("expected host:port, got '{}'", addr))?;
        let port = port
            .parse::<u16>()
            .map_err(|_| format!("invalid port in '{}'", addr))?;

        if !host.is_empty() {
            self.host = host.to_string();
        }
        self.port = port;
        Ok(())
    }
}

/// Observability settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservabilityConfig {
    /// Level or `EnvFilter` directives; `RUST_LOG` applies when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Log format (pretty, compact, text, json)
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        RedisConfig {
            addrs: default_addrs(),
            namespace: default_namespace(),
            rename: HashMap::new(),
            connect_timeout_ms: default_connect_timeout(),
            command_timeout_ms: default_command_timeout(),
            scrape_timeout_ms: default_scrape_timeout(),
            config_metrics: true,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: default_host(),
            port: default_port(),
            metrics_path: default_metrics_path(),
            enabled: true,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        ObservabilityConfig {
            log_level: None,
            log_format: default_log_format(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_addrs() -> Vec<String> {
    vec!["localhost:6379".to_string()]
}

fn default_namespace() -> String {
    "redis".to_string()
}

fn default_connect_timeout() -> u64 {
    5000
}

fn default_command_timeout() -> u64 {
    5000
}

fn default_scrape_timeout() -> u64 {
    10_000
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9121
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_listen_address_round_trip() {
        let mut server = ServerConfig::default();
        assert_eq!(server.listen_address(), "0.0.0.0:9121");

        server.set_listen_address("127.0.0.1:9500").unwrap();
        assert_eq!(server.host, "127.0.0.1");
        assert_eq!(server.port, 9500);

        server.set_listen_address(":9600").unwrap();
        assert_eq!(server.listen_address(), "127.0.0.1:9600");
    }

    #[test]
    fn test_listen_address_errors() {
        let mut server = ServerConfig::default();
        assert!(server.set_listen_address("localhost").is_err());
        assert!(server.set_listen_address("localhost:http").is_err());
        assert_eq!(server, ServerConfig::default());
    }

    #[test]
    fn test_timeouts() {
        let redis = RedisConfig::default();
        assert_eq!(redis.connect_timeout(), Duration::from_secs(5));
        assert_eq!(redis.scrape_timeout(), Duration::from_secs(10));
    }
}
