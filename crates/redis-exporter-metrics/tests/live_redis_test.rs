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
//! Tests against a running Redis server
//!
//! Ignored by default. Run with:
//!
//! ```text
//! REDIS_ADDR=localhost:6379 cargo test -p redis-exporter-metrics -- --ignored
//! ```
//!
//! Keys are written to database 11 and removed afterwards.

use redis_exporter_metrics::{MetricsRegistry, NamingPolicy, RedisExporter};
use redis_exporter_scrape::{
    MetricEvent, RedisConnector, ScrapeCoordinator, ScrapeOptions, TargetSet, Timeouts,
    DB_EXPIRING_KEYS_TOTAL, DB_KEYS_TOTAL,
};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const DB: &str = "db11";

fn redis_addr() -> String {
    std::env::var("REDIS_ADDR").unwrap_or_else(|_| "localhost:6379".to_string())
}

struct Fixture {
    addr: String,
    keys: Vec<String>,
    expiring: Vec<String>,
}

impl Fixture {
    fn new() -> Self {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        Fixture {
            addr: redis_addr(),
            keys: ["john", "paul", "ringo", "george"]
                .iter()
                .map(|n| format!("key-{}-{}", n, ts))
                .collect(),
            expiring: ["A.J.", "Howie", "Nick", "Kevin", "Brian"]
                .iter()
                .map(|n| format!("key-exp-{}-{}", n, ts))
                .collect(),
        }
    }

    async fn connection(&self) -> redis::aio::MultiplexedConnection {
        let client = redis::Client::open(format!("redis://{}/11", self.addr)).expect("redis url");
        client
            .get_multiplexed_async_connection()
            .await
            .expect("connect to redis")
    }

    async fn seed(&self) {
        let mut conn = self.connection().await;
        for key in &self.keys {
            redis::cmd("SET")
                .arg(key)
                .arg("value")
                .query_async::<_, ()>(&mut conn)
                .await
                .expect("SET");
        }
        // 300 seconds is plenty for a test run
        for key in &self.expiring {
            redis::cmd("SETEX")
                .arg(key)
                .arg(300)
                .arg("value")
                .query_async::<_, ()>(&mut conn)
                .await
                .expect("SETEX");
        }
        tokio::time::sleep(Duration::from_millis(150)).await;
    }

    async fn delete(&self) {
        let mut conn = self.connection().await;
        for key in self.keys.iter().chain(&self.expiring) {
            let _ = redis::cmd("DEL")
                .arg(key)
                .query_async::<_, i64>(&mut conn)
                .await;
        }
    }

    fn coordinator(&self) -> ScrapeCoordinator {
        ScrapeCoordinator::new(
            Arc::new(RedisConnector::new(Timeouts::default())),
            ScrapeOptions::default(),
        )
    }

    fn targets(&self) -> TargetSet {
        TargetSet::parse_list(&self.addr, ',').expect("valid REDIS_ADDR")
    }
}

fn db_value(events: &[MetricEvent], name: &str) -> f64 {
    events
        .iter()
        .find(|e| e.name == name && e.database.as_deref() == Some(DB))
        .map_or(0.0, |e| e.value)
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn test_counting_keys() {
    let fixture = Fixture::new();
    let coordinator = fixture.coordinator();
    let targets = fixture.targets();

    let (events, _) = coordinator.collect(&targets).await;
    let baseline_keys = db_value(&events, DB_KEYS_TOTAL);
    let baseline_expiring = db_value(&events, DB_EXPIRING_KEYS_TOTAL);

    fixture.seed().await;
    let (events, report) = coordinator.collect(&targets).await;
    fixture.delete().await;

    assert!(!report.has_failures());
    assert_eq!(
        db_value(&events, DB_KEYS_TOTAL),
        baseline_keys + (fixture.keys.len() + fixture.expiring.len()) as f64
    );
    assert_eq!(
        db_value(&events, DB_EXPIRING_KEYS_TOTAL),
        baseline_expiring + fixture.expiring.len() as f64
    );

    let (events, _) = coordinator.collect(&targets).await;
    assert_eq!(db_value(&events, DB_KEYS_TOTAL), baseline_keys);
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn test_exporter_metrics() {
    let fixture = Fixture::new();
    let exporter = RedisExporter::new(
        fixture.targets(),
        fixture.coordinator(),
        MetricsRegistry::new(NamingPolicy::new("test")).expect("registry"),
    );

    fixture.seed().await;
    let report = exporter.scrape_cycle().await;
    fixture.delete().await;

    assert!(!report.has_failures());

    let registry = exporter.registry();
    assert!(
        registry.len() > 25,
        "need more metrics, found {}",
        registry.len()
    );
    for name in [
        "test_db_keys_total",
        "test_db_avg_ttl_seconds",
        "test_instantaneous_ops_per_sec",
        "test_used_cpu_sys",
        "test_repl_loading",
    ] {
        assert!(registry.contains(name), "missing metric {}", name);
    }
}
