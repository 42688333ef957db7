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
//! Command execution against a single Redis instance
//!
//! The scrape coordinator only needs "run this command on that address and
//! give me the reply". [`Connector`] opens a [`Session`] per target and
//! [`RedisConnector`] is the production implementation on top of the `redis`
//! crate. Every network step is bounded by a timeout; an elapsed deadline is
//! reported as [`ScrapeError::Timeout`].

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use std::fmt;
use std::time::Duration;
use tokio::time::timeout;
use tracing::trace;

use crate::error::{ScrapeError, ScrapeResult};

/// Reply to a command, decoupled from the wire client
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Bulk or status string
    Text(String),
    /// Integer reply
    Integer(i64),
    /// Multi-bulk reply
    Array(Vec<Reply>),
    /// Null reply
    Nil,
}

impl Reply {
    /// Borrow the text of a string reply
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reply::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Flatten an array of string replies, ignoring other element kinds
    pub fn into_strings(self) -> Vec<String> {
        match self {
            Reply::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Reply::Text(text) => Some(text),
                    Reply::Integer(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            Reply::Text(text) => vec![text],
            _ => Vec::new(),
        }
    }
}

impl From<redis::Value> for Reply {
    fn from(value: redis::Value) -> Self {
        match value {
            redis::Value::Data(bytes) => Reply::Text(String::from_utf8_lossy(&bytes).into_owned()),
            redis::Value::Status(status) => Reply::Text(status),
            redis::Value::Okay => Reply::Text("OK".to_string()),
            redis::Value::Int(n) => Reply::Integer(n),
            redis::Value::Bulk(items) => Reply::Array(items.into_iter().map(Reply::from).collect()),
            _ => Reply::Nil,
        }
    }
}

/// An open connection to one target
#[async_trait]
pub trait Session: Send {
    /// Execute `command` with `args` and return the reply
    async fn execute(&mut self, command: &str, args: &[&str]) -> ScrapeResult<Reply>;
}

/// Opens sessions against `host:port` addresses
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect to `addr`
    async fn connect(&self, addr: &str) -> ScrapeResult<Box<dyn Session>>;
}

/// Deadlines applied to every target session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Deadline for establishing the connection
    pub connect: Duration,
    /// Deadline for each command round-trip
    pub command: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            connect: Duration::from_secs(5),
            command: Duration::from_secs(5),
        }
    }
}

/// [`Connector`] backed by the `redis` crate
#[derive(Clone, Default)]
pub struct RedisConnector {
    timeouts: Timeouts,
}

impl RedisConnector {
    /// Create a connector with the given deadlines
    pub fn new(timeouts: Timeouts) -> Self {
        RedisConnector { timeouts }
    }

    /// Configured deadlines
    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }
}

impl fmt::Debug for RedisConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisConnector")
            .field("connect_timeout", &self.timeouts.connect)
            .field("command_timeout", &self.timeouts.command)
            .finish()
    }
}

#[async_trait]
impl Connector for RedisConnector {
    async fn connect(&self, addr: &str) -> ScrapeResult<Box<dyn Session>> {
        let client = redis::Client::open(format!("redis://{}/", addr))
            .map_err(|e| ScrapeError::connection(addr, e))?;

        let conn = timeout(self.timeouts.connect, client.get_multiplexed_async_connection())
            .await
            .map_err(|_| ScrapeError::timeout(addr, "connect", self.timeouts.connect))?
            .map_err(|e| ScrapeError::connection(addr, e))?;

        trace!(addr, "connected");

        Ok(Box::new(RedisSession {
            addr: addr.to_string(),
            conn,
            command_timeout: self.timeouts.command,
        }))
    }
}

/// Session over a multiplexed tokio connection
struct RedisSession {
    addr: String,
    conn: MultiplexedConnection,
    command_timeout: Duration,
}

#[async_trait]
impl Session for RedisSession {
    async fn execute(&mut self, command: &str, args: &[&str]) -> ScrapeResult<Reply> {
        let mut cmd = redis::cmd(command);
        for arg in args {
            cmd.arg(*arg);
        }

        let reply: redis::Value = timeout(self.command_timeout, cmd.query_async(&mut self.conn))
            .await
            .map_err(|_| ScrapeError::timeout(&self.addr, command, self.command_timeout))?
            .map_err(|e| ScrapeError::command(&self.addr, command, e))?;

        Ok(Reply::from(reply))
    }
}
