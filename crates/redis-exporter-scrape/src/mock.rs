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
//! In-memory scripted connector for testing
//!
//! Each address is given a behavior: serve a fixed `INFO` payload, refuse
//! the connection, hang while connecting or after connecting, or accept the
//! connection and fail every command. Payloads can be swapped between scrape cycles to simulate keys
//! being written and deleted.
//!
//! # Examples
//!
//! ```rust,no_run
//! use redis_exporter_scrape::mock::MockConnector;
//! use redis_exporter_scrape::{ScrapeCoordinator, ScrapeOptions, TargetSet};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mock = MockConnector::new();
//! mock.set_info("localhost:6379", "connected_clients:3\r\n");
//!
//! let coordinator = ScrapeCoordinator::new(Arc::new(mock), ScrapeOptions::default());
//! let targets = TargetSet::new(["localhost:6379"]).unwrap();
//! let (events, _report) = coordinator.collect(&targets).await;
//! assert!(!events.is_empty());
//! # }
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use crate::client::{Connector, Reply, Session};
use crate::error::{ScrapeError, ScrapeResult};

#[derive(Debug, Clone)]
enum Behavior {
    Serve { info: String, config: bool },
    Refuse,
    Hang,
    HangCommands,
    FailCommands,
}

/// Scripted [`Connector`] keyed by address
///
/// Cloning shares the script, so a test can keep a handle and change
/// behavior after the connector was handed to a coordinator. Unknown
/// addresses are refused.
#[derive(Clone, Default)]
pub struct MockConnector {
    targets: Arc<RwLock<HashMap<String, Behavior>>>,
    connects: Arc<AtomicUsize>,
}

impl MockConnector {
    /// Create a connector that knows no targets
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&self, addr: &str, behavior: Behavior) {
        let mut targets = self.targets.write().unwrap_or_else(|e| e.into_inner());
        targets.insert(addr.to_string(), behavior);
    }

    /// Serve `info` for `INFO` on `addr`; `CONFIG GET maxmemory` answers 0
    pub fn set_info(&self, addr: &str, info: impl Into<String>) {
        self.set(
            addr,
            Behavior::Serve {
                info: info.into(),
                config: true,
            },
        );
    }

    /// Keep serving `INFO` on `addr` but reject `CONFIG`
    pub fn disable_config(&self, addr: &str) {
        let mut targets = self.targets.write().unwrap_or_else(|e| e.into_inner());
        if let Some(Behavior::Serve { config, .. }) = targets.get_mut(addr) {
            *config = false;
        }
    }

    /// Refuse connections to `addr`
    pub fn refuse(&self, addr: &str) {
        self.set(addr, Behavior::Refuse);
    }

    /// Never complete connection attempts to `addr`
    pub fn hang(&self, addr: &str) {
        self.set(addr, Behavior::Hang);
    }

    /// Accept connections to `addr` and never answer a command
    pub fn hang_commands(&self, addr: &str) {
        self.set(addr, Behavior::HangCommands);
    }

    /// Accept connections to `addr` and fail every command
    pub fn fail_commands(&self, addr: &str) {
        self.set(addr, Behavior::FailCommands);
    }

    /// Number of connection attempts seen so far
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    fn behavior(&self, addr: &str) -> Behavior {
        let targets = self.targets.read().unwrap_or_else(|e| e.into_inner());
        targets.get(addr).cloned().unwrap_or(Behavior::Refuse)
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, addr: &str) -> ScrapeResult<Box<dyn Session>> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        match self.behavior(addr) {
            Behavior::Refuse => Err(ScrapeError::connection(addr, "connection refused")),
            Behavior::Hang => std::future::pending().await,
            behavior => Ok(Box::new(MockSession {
                addr: addr.to_string(),
                behavior,
            })),
        }
    }
}

struct MockSession {
    addr: String,
    behavior: Behavior,
}

#[async_trait]
impl Session for MockSession {
    async fn execute(&mut self, command: &str, args: &[&str]) -> ScrapeResult<Reply> {
        if let Behavior::HangCommands = self.behavior {
            std::future::pending::<()>().await;
        }

        let Behavior::Serve { info, config } = &self.behavior else {
            return Err(ScrapeError::command(&self.addr, command, "ERR scripted failure"));
        };

        match (command.to_ascii_uppercase().as_str(), args) {
            ("INFO", _) => Ok(Reply::Text(info.clone())),
            ("CONFIG", ["GET", name]) if *config => Ok(Reply::Array(vec![
                Reply::Text((*name).to_string()),
                Reply::Text("0".to_string()),
            ])),
            _ => Err(ScrapeError::command(
                &self.addr,
                command,
                format!("ERR unknown command '{}'", command),
            )),
        }
    }
}
