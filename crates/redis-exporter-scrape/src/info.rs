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
//! Parser for the text returned by `INFO`
//!
//! The payload is a list of `name:value` lines grouped under `# Section`
//! headers. Numeric values become server-wide [`MetricEvent`]s, `db<N>` lines
//! are handed to the keyspace parser, and everything else (version strings,
//! replica descriptions, empty values) is skipped without failing the scrape.

use tracing::debug;

use crate::event::{MetricEvent, DB_AVG_TTL_SECONDS, DB_EXPIRING_KEYS_TOTAL, DB_KEYS_TOTAL};
use crate::keyspace::{is_db_label, parse_keyspace};

/// Convert one `INFO` payload from `source_addr` into metric events
pub fn parse_info(payload: &str, source_addr: &str) -> Vec<MetricEvent> {
    let mut events = Vec::new();

    for line in payload.split('\n') {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((name, value)) = line.split_once(':') else {
            continue;
        };

        if is_db_label(name) {
            match parse_keyspace(name, value) {
                Some(stats) => {
                    events.push(MetricEvent::database(
                        DB_KEYS_TOTAL,
                        name,
                        stats.keys,
                        source_addr,
                    ));
                    events.push(MetricEvent::database(
                        DB_EXPIRING_KEYS_TOTAL,
                        name,
                        stats.expires,
                        source_addr,
                    ));
                    events.push(MetricEvent::database(
                        DB_AVG_TTL_SECONDS,
                        name,
                        stats.avg_ttl / 1000.0,
                        source_addr,
                    ));
                }
                None => {
                    debug!(addr = source_addr, line, "skipping malformed keyspace line");
                }
            }
            continue;
        }

        if let Ok(value) = value.parse::<f64>() {
            events.push(MetricEvent::server(name, value, source_addr));
        }
    }

    events
}

/// Convert a flat `CONFIG GET` reply (`[name, value, name, value, ...]`)
/// into `config_<name>` events, skipping non-numeric settings
pub fn parse_config_pairs(pairs: &[String], source_addr: &str) -> Vec<MetricEvent> {
    pairs
        .chunks_exact(2)
        .filter_map(|pair| {
            let value = pair[1].parse::<f64>().ok()?;
            Some(MetricEvent::server(
                format!("config_{}", pair[0]),
                value,
                source_addr,
            ))
        })
        .collect()
}
