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
//! The unit flowing from scrape tasks to the metric registry

/// Synthetic name for the per-database key count
pub const DB_KEYS_TOTAL: &str = "db_keys_total";
/// Synthetic name for the per-database count of keys with an expiry
pub const DB_EXPIRING_KEYS_TOTAL: &str = "db_expiring_keys_total";
/// Synthetic name for the per-database average TTL, in seconds
pub const DB_AVG_TTL_SECONDS: &str = "db_avg_ttl_seconds";

/// One normalized sample produced by parsing a target's diagnostic output
#[derive(Debug, Clone, PartialEq)]
pub struct MetricEvent {
    /// Raw field name, before renaming and namespacing
    pub name: String,
    /// `db<N>` for per-database samples, `None` for server-wide ones
    pub database: Option<String>,
    /// Sample value
    pub value: f64,
    /// Address of the target that produced the sample
    pub source_addr: String,
}

impl MetricEvent {
    /// Server-wide sample
    pub fn server(name: impl Into<String>, value: f64, source_addr: impl Into<String>) -> Self {
        MetricEvent {
            name: name.into(),
            database: None,
            value,
            source_addr: source_addr.into(),
        }
    }

    /// Per-database sample
    pub fn database(
        name: impl Into<String>,
        database: impl Into<String>,
        value: f64,
        source_addr: impl Into<String>,
    ) -> Self {
        MetricEvent {
            name: name.into(),
            database: Some(database.into()),
            value,
            source_addr: source_addr.into(),
        }
    }

    /// Whether the sample carries a database label
    pub fn is_per_database(&self) -> bool {
        self.database.is_some()
    }
}
