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
//! Metrics registry for scraped Redis values
//!
//! Gauges are created lazily, one per exported name, the first time an event
//! for that name arrives. The first event also fixes the label shape:
//! `addr` for server-wide fields, `addr` and `db` for per-database ones.
//! Handles are never removed, so a database that disappears from `INFO` keeps
//! its last value.

use prometheus::{Counter, Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};
use redis_exporter_scrape::MetricEvent;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

use crate::names::NamingPolicy;

const SERVER_LABELS: &[&str] = &["addr"];
const DATABASE_LABELS: &[&str] = &["addr", "db"];

/// Errors raised while applying events to the registry
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Creating or registering a collector failed
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// An event's labels do not match the shape the metric was created with
    #[error("label shape conflict for {name}: registered with {registered:?}, event has {event:?}")]
    LabelShape {
        /// Exported metric name
        name: String,
        /// Labels of the existing metric
        registered: &'static [&'static str],
        /// Labels the event would need
        event: &'static [&'static str],
    },

    /// Encoding the exposition failed
    #[error("encoding error: {0}")]
    Encoding(String),
}

/// Result alias for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

struct MetricHandle {
    gauge: GaugeVec,
    labels: &'static [&'static str],
    series: HashSet<Vec<String>>,
}

/// Registry of exported Redis metrics
///
/// Cheap to clone; clones share the underlying prometheus registry.
#[derive(Clone)]
pub struct MetricsRegistry {
    inner: Arc<MetricsRegistryInner>,
}

struct MetricsRegistryInner {
    registry: Registry,
    naming: NamingPolicy,
    metrics: RwLock<HashMap<String, MetricHandle>>,

    // Exporter self-metrics
    scrapes_total: Counter,
    last_scrape_duration: Gauge,
    last_scrape_error: Gauge,
}

impl MetricsRegistry {
    /// Create a registry and register the exporter self-metrics
    pub fn new(naming: NamingPolicy) -> RegistryResult<Self> {
        let registry = Registry::new();

        let scrapes_total = Counter::with_opts(Opts::new(
            naming.prefixed("exporter_scrapes_total"),
            "Scrape cycles run by the exporter",
        ))?;
        registry.register(Box::new(scrapes_total.clone()))?;

        let last_scrape_duration = Gauge::with_opts(Opts::new(
            naming.prefixed("exporter_last_scrape_duration_seconds"),
            "Duration of the last scrape cycle in seconds",
        ))?;
        registry.register(Box::new(last_scrape_duration.clone()))?;

        let last_scrape_error = Gauge::with_opts(Opts::new(
            naming.prefixed("exporter_last_scrape_error"),
            "Whether any target failed during the last scrape cycle",
        ))?;
        registry.register(Box::new(last_scrape_error.clone()))?;

        Ok(Self {
            inner: Arc::new(MetricsRegistryInner {
                registry,
                naming,
                metrics: RwLock::new(HashMap::new()),
                scrapes_total,
                last_scrape_duration,
                last_scrape_error,
            }),
        })
    }

    /// Get the underlying Prometheus registry
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Naming policy applied to incoming events
    pub fn naming(&self) -> &NamingPolicy {
        &self.inner.naming
    }

    /// Apply one event: resolve its name, create the gauge if needed, set it
    pub fn apply(&self, event: &MetricEvent) -> RegistryResult<()> {
        let exported = self.inner.naming.resolve(&event.name);
        let labels = label_shape(event);
        let values = label_values(event);

        {
            let metrics = self.inner.metrics.read().unwrap_or_else(|e| e.into_inner());
            if let Some(handle) = metrics.get(&exported.name) {
                if handle.labels != labels {
                    return Err(RegistryError::LabelShape {
                        name: exported.name,
                        registered: handle.labels,
                        event: labels,
                    });
                }
                if handle.series.contains(&values) {
                    set(&handle.gauge, &values, event.value)?;
                    return Ok(());
                }
            }
        }

        let mut metrics = self.inner.metrics.write().unwrap_or_else(|e| e.into_inner());
        let handle = match metrics.entry(exported.name.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let gauge = GaugeVec::new(Opts::new(exported.name.clone(), exported.help), labels)?;
                self.inner.registry.register(Box::new(gauge.clone()))?;
                debug!(metric = %exported.name, "registered metric");
                entry.insert(MetricHandle {
                    gauge,
                    labels,
                    series: HashSet::new(),
                })
            }
        };

        // Another shape may have won the race between the two locks
        if handle.labels != labels {
            return Err(RegistryError::LabelShape {
                name: exported.name,
                registered: handle.labels,
                event: labels,
            });
        }

        set(&handle.gauge, &values, event.value)?;
        handle.series.insert(values);
        Ok(())
    }

    /// Drain `events` until the stream closes; returns how many were applied
    ///
    /// Events that cannot be applied are dropped with a warning.
    pub async fn consume(&self, mut events: UnboundedReceiver<MetricEvent>) -> usize {
        let mut applied = 0;
        while let Some(event) = events.recv().await {
            match self.apply(&event) {
                Ok(()) => applied += 1,
                Err(e) => warn!(
                    field = %event.name,
                    addr = %event.source_addr,
                    error = %e,
                    "dropping metric event"
                ),
            }
        }
        applied
    }

    /// Record the outcome of one scrape cycle
    pub fn record_scrape(&self, duration: Duration, failed: bool) {
        self.inner.scrapes_total.inc();
        self.inner.last_scrape_duration.set(duration.as_secs_f64());
        self.inner
            .last_scrape_error
            .set(if failed { 1.0 } else { 0.0 });
    }

    /// Exported names created so far, sorted
    pub fn metric_names(&self) -> Vec<String> {
        let metrics = self.inner.metrics.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = metrics.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether a metric with this exported name exists
    pub fn contains(&self, name: &str) -> bool {
        let metrics = self.inner.metrics.read().unwrap_or_else(|e| e.into_inner());
        metrics.contains_key(name)
    }

    /// Number of distinct exported names
    pub fn len(&self) -> usize {
        let metrics = self.inner.metrics.read().unwrap_or_else(|e| e.into_inner());
        metrics.len()
    }

    /// Whether no metric was created yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current value of `name` for target `addr` and optional database
    pub fn value(&self, name: &str, addr: &str, db: Option<&str>) -> Option<f64> {
        let metrics = self.inner.metrics.read().unwrap_or_else(|e| e.into_inner());
        let handle = metrics.get(name)?;

        let values: Vec<String> = match db {
            Some(db) => vec![addr.to_string(), db.to_string()],
            None => vec![addr.to_string()],
        };
        if !handle.series.contains(&values) {
            return None;
        }

        let refs: Vec<&str> = values.iter().map(String::as_str).collect();
        handle
            .gauge
            .get_metric_with_label_values(&refs)
            .ok()
            .map(|g| g.get())
    }

    /// Number of completed scrape cycles
    pub fn scrapes_total(&self) -> f64 {
        self.inner.scrapes_total.get()
    }

    /// 1 when the last cycle had a failed target
    pub fn last_scrape_error(&self) -> f64 {
        self.inner.last_scrape_error.get()
    }

    /// Encode everything in the Prometheus text format
    pub fn encode_text(&self) -> RegistryResult<String> {
        let families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| RegistryError::Encoding(e.to_string()))
    }
}

fn label_shape(event: &MetricEvent) -> &'static [&'static str] {
    if event.is_per_database() {
        DATABASE_LABELS
    } else {
        SERVER_LABELS
    }
}

fn label_values(event: &MetricEvent) -> Vec<String> {
    let mut values = vec![event.source_addr.clone()];
    if let Some(db) = &event.database {
        values.push(db.clone());
    }
    values
}

fn set(gauge: &GaugeVec, values: &[String], value: f64) -> RegistryResult<()> {
    let refs: Vec<&str> = values.iter().map(String::as_str).collect();
    gauge.get_metric_with_label_values(&refs)?.set(value);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use redis_exporter_scrape::DB_KEYS_TOTAL;

    fn registry() -> MetricsRegistry {
        MetricsRegistry::new(NamingPolicy::new("test")).unwrap()
    }

    #[test]
    fn test_registry_creation() {
        let registry = registry();
        assert!(registry.is_empty());
        assert_eq!(registry.scrapes_total(), 0.0);
    }

    #[test]
    fn test_apply_creates_metric_once() {
        let registry = registry();

        registry
            .apply(&MetricEvent::server("connected_clients", 3.0, "a:6379"))
            .unwrap();
        registry
            .apply(&MetricEvent::server("connected_clients", 5.0, "a:6379"))
            .unwrap();
        registry
            .apply(&MetricEvent::server("connected_clients", 1.0, "b:6379"))
            .unwrap();

        assert_eq!(registry.metric_names(), vec!["test_connected_clients"]);
        assert_eq!(
            registry.value("test_connected_clients", "a:6379", None),
            Some(5.0)
        );
        assert_eq!(
            registry.value("test_connected_clients", "b:6379", None),
            Some(1.0)
        );
    }

    #[test]
    fn test_per_database_labels() {
        let registry = registry();

        registry
            .apply(&MetricEvent::database(DB_KEYS_TOTAL, "db0", 10.0, "a:6379"))
            .unwrap();
        registry
            .apply(&MetricEvent::database(DB_KEYS_TOTAL, "db3", 4.0, "a:6379"))
            .unwrap();

        assert_eq!(
            registry.value("test_db_keys_total", "a:6379", Some("db0")),
            Some(10.0)
        );
        assert_eq!(
            registry.value("test_db_keys_total", "a:6379", Some("db3")),
            Some(4.0)
        );
        assert_eq!(registry.value("test_db_keys_total", "a:6379", Some("db1")), None);
    }

    #[test]
    fn test_label_shape_conflict_is_rejected() {
        let registry = registry();

        registry
            .apply(&MetricEvent::server("weird", 1.0, "a:6379"))
            .unwrap();
        let err = registry
            .apply(&MetricEvent::database("weird", "db0", 2.0, "a:6379"))
            .unwrap_err();

        assert!(matches!(err, RegistryError::LabelShape { .. }));
        assert_eq!(registry.value("test_weird", "a:6379", None), Some(1.0));
    }

    #[test]
    fn test_renamed_field_only_under_mapped_name() {
        let registry = registry();

        registry
            .apply(&MetricEvent::server("loading", 0.0, "a:6379"))
            .unwrap();

        assert!(registry.contains("test_repl_loading"));
        assert!(!registry.contains("test_loading"));
    }

    #[test]
    fn test_record_scrape_updates_self_metrics() {
        let registry = registry();

        registry.record_scrape(Duration::from_millis(250), true);
        assert_eq!(registry.scrapes_total(), 1.0);
        assert_eq!(registry.last_scrape_error(), 1.0);

        registry.record_scrape(Duration::from_millis(100), false);
        assert_eq!(registry.scrapes_total(), 2.0);
        assert_eq!(registry.last_scrape_error(), 0.0);
    }

    #[test]
    fn test_encode_text_contains_metrics() {
        let registry = registry();
        registry
            .apply(&MetricEvent::server("uptime_in_seconds", 42.0, "a:6379"))
            .unwrap();

        let text = registry.encode_text().unwrap();
        assert!(text.contains("# HELP test_uptime_in_seconds"));
        assert!(text.contains("test_uptime_in_seconds{addr=\"a:6379\"} 42"));
        assert!(text.contains("test_exporter_scrapes_total"));
    }

    #[tokio::test]
    async fn test_consume_drains_until_closed() {
        let registry = registry();
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tx.send(MetricEvent::server("a", 1.0, "x:1")).unwrap();
        tx.send(MetricEvent::server("a", 2.0, "x:1")).unwrap();
        tx.send(MetricEvent::database("a", "db0", 3.0, "x:1")).unwrap();
        drop(tx);

        let applied = registry.consume(rx).await;
        assert_eq!(applied, 2);
        assert_eq!(registry.value("test_a", "x:1", None), Some(2.0));
    }
}
