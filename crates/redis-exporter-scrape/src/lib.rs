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
//! Redis exporter scraping
//!
//! Turns a list of Redis addresses into a stream of normalized metric events.
//!
//! # Pipeline
//!
//! - [`TargetSet`]: validated `host:port` list, built once
//! - [`ScrapeCoordinator`]: one task per target, all feeding one channel
//! - [`parse_info`]: `INFO` text to [`MetricEvent`]s, pure
//! - [`parse_keyspace`]: strict `keys=..,expires=..,avg_ttl=..` grammar, pure
//!
//! The crate never touches metric storage; the consumer of the event stream
//! owns that.
//!
//! # Example
//!
//! ```ignore
//! use redis_exporter_scrape::{RedisConnector, ScrapeCoordinator, ScrapeOptions, TargetSet, Timeouts};
//! use std::sync::Arc;
//!
//! let targets = TargetSet::parse_list("localhost:6379,localhost:6380", ',')?;
//! let coordinator = ScrapeCoordinator::new(
//!     Arc::new(RedisConnector::new(Timeouts::default())),
//!     ScrapeOptions::default(),
//! );
//!
//! let mut scrape = coordinator.start(&targets);
//! while let Some(event) = scrape.events.recv().await {
//!     println!("{} {:?} {}", event.name, event.database, event.value);
//! }
//! let report = scrape.done.await?;
//! ```

pub mod client;
pub mod coordinator;
pub mod error;
pub mod event;
pub mod info;
pub mod keyspace;
pub mod mock;
pub mod target;

pub use client::{Connector, RedisConnector, Reply, Session, Timeouts};
pub use coordinator::{Scrape, ScrapeCoordinator, ScrapeOptions, ScrapeReport};
pub use error::{ScrapeError, ScrapeResult};
pub use event::{MetricEvent, DB_AVG_TTL_SECONDS, DB_EXPIRING_KEYS_TOTAL, DB_KEYS_TOTAL};
pub use info::{parse_config_pairs, parse_info};
pub use keyspace::{is_db_label, parse_keyspace, KeyspaceStats};
pub use target::TargetSet;
