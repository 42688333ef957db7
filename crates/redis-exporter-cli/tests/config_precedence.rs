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
//! Precedence of file, environment and flag settings

use clap::Parser;
use redis_exporter_cli::{load_config_with, Args};
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;

fn write_config(dir: &TempDir) -> String {
    let path = dir.path().join("exporter.toml");
    fs::write(
        &path,
        r#"
[redis]
addrs = ["file-host:6379"]
namespace = "from_file"

[server]
port = 9400
"#,
    )
    .unwrap();
    path.to_string_lossy().into_owned()
}

fn no_env(_: &str) -> Option<String> {
    None
}

#[tokio::test]
async fn test_file_values_are_used() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir);

    let args = Args::try_parse_from(["redis-exporter", "--config", path.as_str()]).unwrap();
    let config = load_config_with(&args, no_env).await.unwrap();

    assert_eq!(config.redis.addrs, vec!["file-host:6379"]);
    assert_eq!(config.redis.namespace, "from_file");
    assert_eq!(config.server.port, 9400);
}

#[tokio::test]
async fn test_flags_win_over_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir);

    let args = Args::try_parse_from([
        "redis-exporter",
        "--config",
        path.as_str(),
        "--redis-addr",
        "flag-host:6380",
        "--web-listen-address",
        ":9500",
    ])
    .unwrap();
    let config = load_config_with(&args, no_env).await.unwrap();

    assert_eq!(config.redis.addrs, vec!["flag-host:6380"]);
    assert_eq!(config.redis.namespace, "from_file");
    assert_eq!(config.server.port, 9500);
}

#[tokio::test]
async fn test_invalid_flag_value_is_rejected() {
    let args = Args::try_parse_from(["redis-exporter", "--redis-addr", "localhost"]).unwrap();
    assert!(load_config_with(&args, no_env).await.is_err());
}

#[tokio::test]
async fn test_missing_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.toml");

    let args = Args::try_parse_from([
        "redis-exporter",
        "--config",
        missing.to_str().unwrap(),
    ])
    .unwrap();
    assert!(load_config_with(&args, no_env).await.is_err());
}

#[tokio::test]
async fn test_environment_sits_between_file_and_flags() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir);

    let env: HashMap<&str, &str> = [
        ("REDIS_EXPORTER_NAMESPACE", "from_env"),
        ("REDIS_EXPORTER_REDIS_ADDR", "env-host:6379"),
    ]
    .into_iter()
    .collect();
    let lookup = |name: &str| env.get(name).map(|v| v.to_string());

    let args = Args::try_parse_from([
        "redis-exporter",
        "--config",
        path.as_str(),
        "--redis-addr",
        "flag-host:6380",
    ])
    .unwrap();
    let config = load_config_with(&args, lookup).await.unwrap();

    assert_eq!(config.redis.namespace, "from_env");
    assert_eq!(config.redis.addrs, vec!["flag-host:6380"]);
    assert_eq!(config.server.port, 9400);
}
