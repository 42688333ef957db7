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
//! The exporter: a fixed target set wired to one registry
//!
//! Each call to [`RedisExporter::scrape_cycle`] starts one scrape over every
//! target, applies the resulting events as they arrive and records the
//! self-metrics. Concurrent callers are serialized so the registry only ever
//! has one consumer.

use redis_exporter_scrape::{Scrape, ScrapeCoordinator, ScrapeReport, TargetSet};
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, error, info_span, Instrument};

use crate::registry::MetricsRegistry;

/// Owned exporter state handed to the HTTP layer
pub struct RedisExporter {
    targets: TargetSet,
    coordinator: ScrapeCoordinator,
    registry: MetricsRegistry,
    cycle: Mutex<()>,
}

impl RedisExporter {
    /// Create an exporter for `targets`
    pub fn new(targets: TargetSet, coordinator: ScrapeCoordinator, registry: MetricsRegistry) -> Self {
        Self {
            targets,
            coordinator,
            registry,
            cycle: Mutex::new(()),
        }
    }

    /// Targets scraped on every cycle
    pub fn targets(&self) -> &TargetSet {
        &self.targets
    }

    /// Registry the events are applied to
    pub fn registry(&self) -> &MetricsRegistry {
        &self.registry
    }

    /// Run one scrape cycle and apply its events
    pub async fn scrape_cycle(&self) -> ScrapeReport {
        let _guard = self.cycle.lock().await;
        let started = Instant::now();

        let span = info_span!("scrape_cycle", targets = self.targets.len());
        let report = async {
            let Scrape { events, done } = self.coordinator.start(&self.targets);
            let applied = self.registry.consume(events).await;

            let report = done.await.unwrap_or_else(|e| {
                error!(error = %e, "scrape supervisor aborted");
                ScrapeReport {
                    attempted: self.targets.len(),
                    ..ScrapeReport::default()
                }
            });

            debug!(
                applied,
                sent = report.events,
                failed = report.failed.len(),
                "scrape cycle finished"
            );
            report
        }
        .instrument(span)
        .await;

        self.registry
            .record_scrape(started.elapsed(), report.has_failures());
        report
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::names::NamingPolicy;
    use redis_exporter_scrape::mock::MockConnector;
    use redis_exporter_scrape::ScrapeOptions;
    use std::sync::Arc;

    fn exporter(mock: &MockConnector, addrs: &[&str]) -> RedisExporter {
        RedisExporter::new(
            TargetSet::new(addrs.iter().copied()).unwrap(),
            ScrapeCoordinator::new(Arc::new(mock.clone()), ScrapeOptions::default()),
            MetricsRegistry::new(NamingPolicy::new("test")).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_cycle_records_self_metrics() {
        let mock = MockConnector::new();
        mock.set_info("a:6379", "connected_clients:2\r\n");
        mock.refuse("b:6379");

        let exporter = exporter(&mock, &["a:6379", "b:6379"]);
        let report = exporter.scrape_cycle().await;

        assert_eq!(report.failed, vec!["b:6379".to_string()]);
        assert_eq!(exporter.registry().scrapes_total(), 1.0);
        assert_eq!(exporter.registry().last_scrape_error(), 1.0);
        assert_eq!(
            exporter.registry().value("test_connected_clients", "a:6379", None),
            Some(2.0)
        );
    }

    #[test]
    fn test_cycle_outside_async_test() {
        let mock = MockConnector::new();
        mock.set_info("a:6379", "uptime_in_seconds:9\r\n");

        let exporter = exporter(&mock, &["a:6379"]);
        let report = tokio_test::block_on(exporter.scrape_cycle());

        assert!(!report.has_failures());
        assert_eq!(exporter.registry().last_scrape_error(), 0.0);
    }

    #[tokio::test]
    async fn test_concurrent_cycles_are_serialized() {
        let mock = MockConnector::new();
        mock.set_info("a:6379", "connected_clients:1\r\n");

        let exporter = Arc::new(exporter(&mock, &["a:6379"]));
        let first = tokio::spawn({
            let exporter = Arc::clone(&exporter);
            async move { exporter.scrape_cycle().await }
        });
        let second = tokio::spawn({
            let exporter = Arc::clone(&exporter);
            async move { exporter.scrape_cycle().await }
        });

        first.await.unwrap();
        second.await.unwrap();

        assert_eq!(exporter.registry().scrapes_total(), 2.0);
        assert_eq!(mock.connect_count(), 2);
    }
}
