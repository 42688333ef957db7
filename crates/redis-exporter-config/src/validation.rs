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
//! Validation of loaded settings

use crate::error::{ConfigError, ConfigResult};
use crate::schema::*;
use redis_exporter_scrape::TargetSet;
use tracing_subscriber::EnvFilter;

/// Validator for configuration settings
pub trait Validator {
    /// Check the settings, naming the first offending field
    fn validate(&self) -> ConfigResult<()>;
}

impl Validator for Config {
    fn validate(&self) -> ConfigResult<()> {
        self.redis.validate()?;
        self.server.validate()?;
        self.observability.validate()?;
        Ok(())
    }
}

impl Validator for RedisConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.addrs.is_empty() {
            return Err(ConfigError::MissingRequired("redis.addrs".to_string()));
        }

        TargetSet::new(self.addrs.iter().map(String::as_str))
            .map_err(|e| ConfigError::invalid_value("redis.addrs", e.to_string()))?;

        if !self.namespace.is_empty() && !is_metric_name(&self.namespace) {
            return Err(ConfigError::invalid_value(
                "redis.namespace",
                format!(
                    "must match [a-zA-Z_][a-zA-Z0-9_]*, got '{}'",
                    self.namespace
                ),
            ));
        }

        for (raw, renamed) in &self.rename {
            if !is_metric_name(renamed) {
                return Err(ConfigError::invalid_value(
                    format!("redis.rename.{}", raw),
                    format!("'{}' is not a valid metric name", renamed),
                ));
            }
        }

        for (field, value) in [
            ("redis.connect_timeout_ms", self.connect_timeout_ms),
            ("redis.command_timeout_ms", self.command_timeout_ms),
            ("redis.scrape_timeout_ms", self.scrape_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::invalid_value(field, "must be greater than 0"));
            }
        }

        Ok(())
    }
}

impl Validator for ServerConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !self.enabled {
            return Ok(());
        }

        if self.host.is_empty() {
            return Err(ConfigError::MissingRequired("server.host".to_string()));
        }

        if self.port == 0 {
            return Err(ConfigError::invalid_value(
                "server.port",
                format!("port must be between 1 and 65535, got {}", self.port),
            ));
        }

        if !self.metrics_path.starts_with('/') {
            return Err(ConfigError::invalid_value(
                "server.metrics_path",
                "must start with '/'",
            ));
        }

        if self.metrics_path == "/health" {
            return Err(ConfigError::validation_error(
                "server.metrics_path conflicts with the /health endpoint",
            ));
        }

        Ok(())
    }
}

impl Validator for ObservabilityConfig {
    fn validate(&self) -> ConfigResult<()> {
        if let Some(level) = &self.log_level {
            EnvFilter::try_new(level).map_err(|e| {
                ConfigError::invalid_value("observability.log_level", e.to_string())
            })?;
        }

        let valid_formats = ["pretty", "compact", "text", "json"];
        if !valid_formats.contains(&self.log_format.as_str()) {
            return Err(ConfigError::invalid_value(
                "observability.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        Ok(())
    }
}

/// Prometheus metric name grammar
fn is_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_addrs() {
        for addrs in [vec![], vec![""], vec!["localhost"], vec!["localhost:1234", "redis.somewhere.com"]] {
            let mut config = Config::default();
            config.redis.addrs = addrs.into_iter().map(String::from).collect();
            assert!(config.validate().is_err());
        }
    }

    #[test]
    fn test_multiple_addrs() {
        let mut config = Config::default();
        config.redis.addrs = vec!["localhost:1234".to_string(), "another.one:6379".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_namespace_grammar() {
        let mut config = Config::default();
        config.redis.namespace = "my-redis".to_string();
        assert!(config.validate().is_err());

        config.redis.namespace = "my_redis".to_string();
        assert!(config.validate().is_ok());

        config.redis.namespace = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_rename_target() {
        let mut config = Config::default();
        config
            .redis
            .rename
            .insert("used_memory".to_string(), "9lives".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_timeout() {
        let mut config = Config::default();
        config.redis.command_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_metrics_path() {
        let mut config = Config::default();
        config.server.metrics_path = "metrics".to_string();
        assert!(config.validate().is_err());

        config.server.metrics_path = "/health".to_string();
        assert!(config.validate().is_err());

        // not checked when the endpoint is off
        config.server.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.observability.log_level = Some("redis_exporter_scrape=loud".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_level_directives() {
        let mut config = Config::default();
        assert!(config.observability.log_level.is_none());

        config.observability.log_level = Some("warn".to_string());
        assert!(config.validate().is_ok());

        config.observability.log_level = Some("info,redis_exporter_scrape=debug".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_metric_name_grammar() {
        assert!(is_metric_name("redis"));
        assert!(is_metric_name("_x1"));
        assert!(!is_metric_name("1x"));
        assert!(!is_metric_name("a.b"));
        assert!(!is_metric_name(""));
    }
}
