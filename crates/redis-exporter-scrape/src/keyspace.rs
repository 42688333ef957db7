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
//! Strict parser for the per-database keyspace summary
//!
//! `INFO` reports one line per non-empty database:
//!
//! ```text
//! db0:keys=1,expires=0,avg_ttl=0
//! ```
//!
//! The value grammar is fixed: exactly three assignments, in this order,
//! each with an integer right-hand side. Anything else is rejected.

/// Parsed keyspace summary, values as reported by the server
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyspaceStats {
    /// Total number of keys in the database
    pub keys: f64,
    /// Number of keys with an expiry set
    pub expires: f64,
    /// Average TTL in milliseconds, unconverted
    pub avg_ttl: f64,
}

const FIELDS: [&str; 3] = ["keys", "expires", "avg_ttl"];

/// Whether `label` has the shape `db<digits>`
pub fn is_db_label(label: &str) -> bool {
    match label.strip_prefix("db") {
        Some(digits) => !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
        None => false,
    }
}

/// Parse the keyspace summary of database `db`
///
/// Returns `None` when `db` is not `db<digits>` or `stats` deviates from
/// `keys=<int>,expires=<int>,avg_ttl=<int>` in any way. Never panics.
pub fn parse_keyspace(db: &str, stats: &str) -> Option<KeyspaceStats> {
    if !is_db_label(db) {
        return None;
    }

    let mut values = [0.0_f64; 3];
    let mut parts = stats.split(',');

    for (slot, expected) in values.iter_mut().zip(FIELDS) {
        let (key, raw) = parts.next()?.split_once('=')?;
        if key != expected {
            return None;
        }
        // "keys=1234=1234" leaves a second '=' in the value
        let parsed: i64 = raw.parse().ok()?;
        *slot = parsed as f64;
    }

    if parts.next().is_some() {
        return None;
    }

    let [keys, expires, avg_ttl] = values;
    Some(KeyspaceStats {
        keys,
        expires,
        avg_ttl,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyspace_string_parser() {
        let cases: &[(&str, &str, Option<(f64, f64, f64)>)] = &[
            ("xxx", "", None),
            ("xxx", "keys=1,expires=0,avg_ttl=0", None),
            ("db0", "xxx", None),
            ("db1", "keys=abcd,expires=0,avg_ttl=0", None),
            ("db2", "keys=1234=1234,expires=0,avg_ttl=0", None),
            ("db3", "keys=abcde,expires=0", None),
            ("db3", "keys=213,expires=xxx", None),
            ("db3", "keys=123,expires=0,avg_ttl=zzz", None),
            ("db0", "keys=1,expires=0,avg_ttl=0", Some((1.0, 0.0, 0.0))),
        ];

        for (db, stats, expected) in cases {
            let got = parse_keyspace(db, stats).map(|s| (s.keys, s.expires, s.avg_ttl));
            assert_eq!(got, *expected, "db:{} stats:{}", db, stats);
        }
    }

    #[test]
    fn test_field_order_and_count_are_strict() {
        assert_eq!(parse_keyspace("db0", "expires=0,keys=1,avg_ttl=0"), None);
        assert_eq!(parse_keyspace("db0", "keys=1,expires=0,ttl=0"), None);
        assert_eq!(parse_keyspace("db0", "keys=1,expires=0,avg_ttl=0,"), None);
        assert_eq!(
            parse_keyspace("db0", "keys=1,expires=0,avg_ttl=0,subexpiry=0"),
            None
        );
        assert_eq!(parse_keyspace("db0", "keys=,expires=0,avg_ttl=0"), None);
    }

    #[test]
    fn test_avg_ttl_is_not_converted() {
        let stats = parse_keyspace("db11", "keys=9,expires=5,avg_ttl=299850").unwrap_or(
            KeyspaceStats {
                keys: -1.0,
                expires: -1.0,
                avg_ttl: -1.0,
            },
        );
        assert_eq!(stats.keys, 9.0);
        assert_eq!(stats.expires, 5.0);
        assert_eq!(stats.avg_ttl, 299_850.0);
    }

    #[test]
    fn test_db_label_shape() {
        assert!(is_db_label("db0"));
        assert!(is_db_label("db15"));
        assert!(!is_db_label("db"));
        assert!(!is_db_label("dbx"));
        assert!(!is_db_label("db1a"));
        assert!(!is_db_label("xdb1"));
    }
}
