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
//! Fan-out of one scrape task per target into a single event stream
//!
//! Every task owns a clone of the channel sender and the coordinator drops
//! its own copy right after spawning, so the receiver sees the end of the
//! stream exactly when the last task has finished. The task set is drained
//! by a supervisor that records which targets failed; failures are logged
//! there and never reach the event consumer.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::timeout;
use tracing::{debug, error, warn, Instrument};

use crate::client::Connector;
use crate::error::{ScrapeError, ScrapeResult};
use crate::event::MetricEvent;
use crate::info::{parse_config_pairs, parse_info};
use crate::target::TargetSet;

/// Tuning for a scrape cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeOptions {
    /// Also run `CONFIG GET maxmemory` after `INFO`
    pub config_metrics: bool,
    /// Upper bound on everything a single target task does
    pub target_deadline: Duration,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        ScrapeOptions {
            config_metrics: true,
            target_deadline: Duration::from_secs(10),
        }
    }
}

/// Outcome of one scrape cycle, available once every target was attempted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeReport {
    /// Number of targets a task was spawned for
    pub attempted: usize,
    /// Addresses whose task ended with an error
    pub failed: Vec<String>,
    /// Number of events sent across all targets
    pub events: usize,
}

impl ScrapeReport {
    /// Whether any target failed
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// A running scrape cycle
pub struct Scrape {
    /// Events from all targets, in arrival order; closes when every task is done
    pub events: mpsc::UnboundedReceiver<MetricEvent>,
    /// Resolves to the cycle report after the last task finished
    pub done: JoinHandle<ScrapeReport>,
}

/// Spawns per-target scrape tasks
#[derive(Clone)]
pub struct ScrapeCoordinator {
    connector: Arc<dyn Connector>,
    options: ScrapeOptions,
}

impl ScrapeCoordinator {
    /// Create a coordinator that opens sessions through `connector`
    pub fn new(connector: Arc<dyn Connector>, options: ScrapeOptions) -> Self {
        ScrapeCoordinator { connector, options }
    }

    /// Scrape options in effect
    pub fn options(&self) -> ScrapeOptions {
        self.options
    }

    /// Start a scrape cycle over `targets`
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, targets: &TargetSet) -> Scrape {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut tasks = JoinSet::new();

        for addr in targets.iter() {
            let tx = tx.clone();
            let connector = Arc::clone(&self.connector);
            let options = self.options;
            let addr = addr.to_string();
            let span = tracing::debug_span!("scrape_target", addr = %addr);

            tasks.spawn(
                async move {
                    let outcome = match timeout(
                        options.target_deadline,
                        scrape_target(connector.as_ref(), &addr, options, &tx),
                    )
                    .await
                    {
                        Ok(outcome) => outcome,
                        Err(_) => Err(ScrapeError::timeout(
                            &addr,
                            "scrape",
                            options.target_deadline,
                        )),
                    };
                    (addr, outcome)
                }
                .instrument(span),
            );
        }

        // Only the task clones keep the channel open from here on
        drop(tx);

        let attempted = targets.len();
        let done = tokio::spawn(async move {
            let mut report = ScrapeReport {
                attempted,
                ..ScrapeReport::default()
            };

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((addr, Ok(sent))) => {
                        debug!(addr = %addr, events = sent, "target scraped");
                        report.events += sent;
                    }
                    Ok((addr, Err(e))) => {
                        warn!(addr = %addr, kind = e.kind(), error = %e, "target scrape failed");
                        report.failed.push(addr);
                    }
                    Err(e) => {
                        error!(error = %e, "scrape task aborted");
                    }
                }
            }

            report
        });

        Scrape { events: rx, done }
    }

    /// Run a full cycle and buffer every event; convenient for one-shot use
    pub async fn collect(&self, targets: &TargetSet) -> (Vec<MetricEvent>, ScrapeReport) {
        let Scrape { mut events, done } = self.start(targets);

        let mut buffered = Vec::new();
        while let Some(event) = events.recv().await {
            buffered.push(event);
        }

        let report = done.await.unwrap_or_else(|e| {
            error!(error = %e, "scrape supervisor aborted");
            ScrapeReport {
                attempted: targets.len(),
                ..ScrapeReport::default()
            }
        });

        (buffered, report)
    }
}

/// Scrape one target and forward its events; returns the number sent
async fn scrape_target(
    connector: &dyn Connector,
    addr: &str,
    options: ScrapeOptions,
    tx: &mpsc::UnboundedSender<MetricEvent>,
) -> ScrapeResult<usize> {
    let mut session = connector.connect(addr).await?;

    let reply = session.execute("INFO", &[]).await?;
    let payload = reply
        .as_text()
        .ok_or_else(|| ScrapeError::command(addr, "INFO", "reply is not a string"))?;

    let mut events = parse_info(payload, addr);

    if options.config_metrics {
        // Managed offerings often rename or disable CONFIG
        match session.execute("CONFIG", &["GET", "maxmemory"]).await {
            Ok(reply) => events.extend(parse_config_pairs(&reply.into_strings(), addr)),
            Err(e) => debug!(addr, error = %e, "CONFIG GET unavailable"),
        }
    }

    let mut sent = 0;
    for event in events {
        if tx.send(event).is_err() {
            // consumer went away; nothing left to do for this cycle
            break;
        }
        sent += 1;
    }

    Ok(sent)
}
