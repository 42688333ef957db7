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
//! File loading and environment overrides

use crate::error::{ConfigError, ConfigResult};
use crate::schema::Config;
use crate::validation::Validator;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "REDIS_EXPORTER_";

/// Configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml`
    Toml,
    /// `.yaml` or `.yml`
    Yaml,
    /// `.json`
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::InvalidPath(path.to_path_buf())),
        }
    }

    /// Get format name as string
    pub fn name(&self) -> &'static str {
        match self {
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Yaml => "YAML",
            ConfigFormat::Json => "JSON",
        }
    }
}

/// Configuration loader
pub struct ConfigLoader {
    validate: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        ConfigLoader { validate: true }
    }

    /// Create a loader without validation
    pub fn without_validation() -> Self {
        ConfigLoader { validate: false }
    }

    /// Load configuration from a file
    pub async fn load_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<Config> {
        let config = self.read_file(path).await?;
        self.check(&config)?;
        Ok(config)
    }

    /// Load configuration from a string
    pub fn load_from_string(&self, content: &str, format: ConfigFormat) -> ConfigResult<Config> {
        let config = parse(content, format)?;
        debug!("Configuration loaded from {}", format.name());
        self.check(&config)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    ///
    /// Without a path the built-in defaults are the base. Validation runs
    /// after the overrides so the environment can fix up a file.
    pub async fn load_with_overrides<P: AsRef<Path>>(
        &self,
        path: Option<P>,
    ) -> ConfigResult<Config> {
        self.load_with_lookup(path, |name| std::env::var(name).ok()).await
    }

    /// Like [`ConfigLoader::load_with_overrides`], reading overrides through `lookup`
    pub async fn load_with_lookup<P, F>(&self, path: Option<P>, lookup: F) -> ConfigResult<Config>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => self.read_file(path).await?,
            None => Config::default(),
        };
        self.apply_overrides(&mut config, lookup)?;
        self.check(&config)?;
        Ok(config)
    }

    async fn read_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<Config> {
        let path = path.as_ref();
        debug!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let format = ConfigFormat::from_path(path)?;
        let content = fs::read_to_string(path).await?;

        info!(
            "Loaded {} configuration file: {}",
            format.name(),
            path.display()
        );

        parse(&content, format)
    }

    fn check(&self, config: &Config) -> ConfigResult<()> {
        if self.validate {
            config.validate()?;
            debug!("Configuration validated successfully");
        }
        Ok(())
    }

    /// Apply `REDIS_EXPORTER_*` environment variable overrides
    pub fn apply_env_overrides(&self, config: &mut Config) -> ConfigResult<()> {
        self.apply_overrides(config, |name| std::env::var(name).ok())
    }

    /// Apply overrides read through `lookup`, keyed by full variable name
    pub fn apply_overrides<F>(&self, config: &mut Config, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| {
            let name = format!("{}{}", ENV_PREFIX, suffix);
            lookup(&name).map(|value| (name, value))
        };

        // Redis settings
        if let Some((_, value)) = var("REDIS_ADDR") {
            config.redis.addrs = value
                .split(',')
                .map(str::trim)
                .map(String::from)
                .collect();
        }
        if let Some((_, value)) = var("NAMESPACE") {
            config.redis.namespace = value;
        }
        if let Some((name, value)) = var("CONNECT_TIMEOUT_MS") {
            config.redis.connect_timeout_ms = parse_u64(&name, &value)?;
        }
        if let Some((name, value)) = var("COMMAND_TIMEOUT_MS") {
            config.redis.command_timeout_ms = parse_u64(&name, &value)?;
        }
        if let Some((name, value)) = var("SCRAPE_TIMEOUT_MS") {
            config.redis.scrape_timeout_ms = parse_u64(&name, &value)?;
        }
        if let Some((name, value)) = var("CONFIG_METRICS") {
            config.redis.config_metrics = parse_bool(&name, &value)?;
        }

        // Server settings
        if let Some((name, value)) = var("WEB_LISTEN_ADDRESS") {
            config
                .server
                .set_listen_address(&value)
                .map_err(|reason| ConfigError::env_var_parsing_error(&name, &value, reason))?;
        }
        if let Some((_, value)) = var("WEB_TELEMETRY_PATH") {
            config.server.metrics_path = value;
        }

        // Observability settings
        if let Some((_, value)) = var("LOG_LEVEL") {
            config.observability.log_level = Some(value);
        }
        if let Some((_, value)) = var("LOG_FORMAT") {
            config.observability.log_format = value;
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse(content: &str, format: ConfigFormat) -> ConfigResult<Config> {
    let config: Config = match format {
        ConfigFormat::Toml => toml::from_str(content)?,
        ConfigFormat::Yaml => serde_yaml::from_str(content)?,
        ConfigFormat::Json => serde_json::from_str(content)?,
    };
    Ok(config)
}

fn parse_u64(name: &str, value: &str) -> ConfigResult<u64> {
    value
        .parse()
        .map_err(|_| ConfigError::env_var_parsing_error(name, value, "expected a non-negative integer"))
}

/// Parse boolean from string (accepts: true, false, yes, no, 1, 0, on, off)
fn parse_bool(name: &str, value: &str) -> ConfigResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(ConfigError::env_var_parsing_error(
            name,
            value,
            "expected 'true', 'false', 'yes', 'no', '1', '0', 'on', or 'off'",
        )),
    }
}
