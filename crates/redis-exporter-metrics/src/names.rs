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
//! Mapping from raw `INFO` field names to exported metric names
//!
//! A raw field is first looked up in the rename table, then prefixed with the
//! namespace. The built-in table covers the common counters and memory gauges;
//! configured entries are layered on top and win over built-in ones.

use std::collections::HashMap;

/// Built-in renames: raw field, exported suffix, help text
const DEFAULT_RENAMES: &[(&str, &str, &str)] = &[
    ("loading", "repl_loading", "Whether the server is loading a dump file"),
    ("used_memory", "memory_used_bytes", "Bytes allocated by the Redis allocator"),
    ("used_memory_rss", "memory_used_rss_bytes", "Resident set size of the Redis process"),
    ("used_memory_peak", "memory_used_peak_bytes", "Peak bytes allocated by the Redis allocator"),
    ("used_memory_lua", "memory_used_lua_bytes", "Bytes used by the Lua engine"),
    ("maxmemory", "memory_max_bytes", "Configured memory limit, 0 when unlimited"),
    (
        "total_connections_received",
        "connections_received_total",
        "Connections accepted by the server",
    ),
    (
        "total_commands_processed",
        "commands_processed_total",
        "Commands processed by the server",
    ),
    ("rejected_connections", "rejected_connections_total", "Connections rejected because of maxclients"),
    ("expired_keys", "expired_keys_total", "Key expiration events"),
    ("evicted_keys", "evicted_keys_total", "Keys evicted because of maxmemory"),
    ("keyspace_hits", "keyspace_hits_total", "Successful key lookups"),
    ("keyspace_misses", "keyspace_misses_total", "Failed key lookups"),
    ("total_net_input_bytes", "net_input_bytes_total", "Bytes read from the network"),
    ("total_net_output_bytes", "net_output_bytes_total", "Bytes written to the network"),
    ("db_keys_total", "db_keys_total", "Keys in the database"),
    ("db_expiring_keys_total", "db_expiring_keys_total", "Keys with an expiry in the database"),
    ("db_avg_ttl_seconds", "db_avg_ttl_seconds", "Average TTL of expiring keys in the database"),
];

/// Final name and help text of an exported metric
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedName {
    /// Namespaced metric name
    pub name: String,
    /// Help text shown in the exposition
    pub help: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Rename {
    to: String,
    help: String,
}

/// Rename table plus namespace prefix
#[derive(Debug, Clone)]
pub struct NamingPolicy {
    namespace: String,
    renames: HashMap<String, Rename>,
}

impl NamingPolicy {
    /// Policy with the built-in rename table
    pub fn new(namespace: impl Into<String>) -> Self {
        let renames = DEFAULT_RENAMES
            .iter()
            .map(|(raw, to, help)| {
                (
                    raw.to_string(),
                    Rename {
                        to: to.to_string(),
                        help: help.to_string(),
                    },
                )
            })
            .collect();

        NamingPolicy {
            namespace: namespace.into(),
            renames,
        }
    }

    /// Policy with no renames at all
    pub fn without_defaults(namespace: impl Into<String>) -> Self {
        NamingPolicy {
            namespace: namespace.into(),
            renames: HashMap::new(),
        }
    }

    /// Layer `raw -> mapped` entries over the current table
    pub fn with_renames<I, K, V>(mut self, renames: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (raw, to) in renames {
            let raw = raw.into();
            let help = format!("Redis INFO field {}", raw);
            self.renames.insert(raw, Rename { to: to.into(), help });
        }
        self
    }

    /// Namespace the names are prefixed with
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Mapped name for `raw`, before namespacing
    pub fn mapped<'a>(&'a self, raw: &'a str) -> &'a str {
        self.renames.get(raw).map_or(raw, |r| r.to.as_str())
    }

    /// Prefix `name` with the namespace
    pub fn prefixed(&self, name: &str) -> String {
        if self.namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}_{}", self.namespace, name)
        }
    }

    /// Exported name and help text for raw field `raw`
    pub fn resolve(&self, raw: &str) -> ExportedName {
        match self.renames.get(raw) {
            Some(rename) => ExportedName {
                name: self.prefixed(&rename.to),
                help: rename.help.clone(),
            },
            None => ExportedName {
                name: self.prefixed(raw),
                help: format!("Redis INFO field {}", raw),
            },
        }
    }
}
