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
//! Validated list of Redis instances to poll

use crate::error::{ScrapeError, ScrapeResult};

/// Ordered, non-empty list of `host:port` addresses
///
/// Immutable once built. Construction validates every entry and stops at the
/// first bad one, so a `TargetSet` never exists in a partially valid state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSet {
    addrs: Vec<String>,
}

impl TargetSet {
    /// Validate `addrs` and build a target set
    ///
    /// # Errors
    ///
    /// [`ScrapeError::NoTargets`] for an empty list, otherwise
    /// [`ScrapeError::InvalidAddress`] naming the first offending entry.
    pub fn new<I, S>(addrs: I) -> ScrapeResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let addrs: Vec<String> = addrs.into_iter().map(Into::into).collect();
        if addrs.is_empty() {
            return Err(ScrapeError::NoTargets);
        }

        for addr in &addrs {
            validate_addr(addr)?;
        }

        Ok(TargetSet { addrs })
    }

    /// Split a separator-delimited list (`"a:1,b:2"`) and validate it
    pub fn parse_list(list: &str, separator: char) -> ScrapeResult<Self> {
        Self::new(list.split(separator).map(str::trim))
    }

    /// Addresses in configuration order
    pub fn addrs(&self) -> &[String] {
        &self.addrs
    }

    /// Number of targets
    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    /// Always false for a constructed set; present for API symmetry
    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }

    /// Iterate over the addresses
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.addrs.iter().map(String::as_str)
    }
}

/// Check the `host:port` shape of a single address
fn validate_addr(addr: &str) -> ScrapeResult<()> {
    if addr.is_empty() {
        return Err(ScrapeError::invalid_address(addr, "empty address"));
    }

    // rsplit keeps bracketed IPv6 hosts like "[::1]:6379" intact
    let Some((host, port)) = addr.rsplit_once(':') else {
        return Err(ScrapeError::invalid_address(addr, "missing port"));
    };

    if host.is_empty() {
        return Err(ScrapeError::invalid_address(addr, "missing host"));
    }
    if port.is_empty() {
        return Err(ScrapeError::invalid_address(addr, "missing port"));
    }
    if port.parse::<u16>().is_err() {
        return Err(ScrapeError::invalid_address(addr, "port is not a number"));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_target_set_cases() {
        let cases: &[(&[&str], bool)] = &[
            (&[""], false),
            (&["localhost"], false),
            (&["localhost:1234"], true),
            (&["localhost:1234", "another.one:6379"], true),
            (&["another.one:6379", "redis.somewhere.com"], false),
            (&["localhost:"], false),
            (&[":6379"], false),
            (&["localhost:port"], false),
            (&["localhost:99999"], false),
            (&["[::1]:6379"], true),
        ];

        for (addrs, ok) in cases {
            let result = TargetSet::new(addrs.iter().copied());
            assert_eq!(result.is_ok(), *ok, "addrs: {:?}", addrs);
        }
    }

    #[test]
    fn test_empty_list_rejected() {
        let result = TargetSet::new(Vec::<String>::new());
        assert!(matches!(result, Err(ScrapeError::NoTargets)));
    }

    #[test]
    fn test_error_names_first_bad_entry() {
        let err = TargetSet::new(["a:1", "b", "c"]).unwrap_err();
        match err {
            ScrapeError::InvalidAddress { addr, .. } => assert_eq!(addr, "b"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_list_preserves_order() {
        let targets = TargetSet::parse_list("redis-a:6379, redis-b:6380", ',').unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets.addrs(), ["redis-a:6379", "redis-b:6380"]);
        assert_eq!(targets.iter().next(), Some("redis-a:6379"));
    }
}
