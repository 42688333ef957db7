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
//! Scrape error types

use std::time::Duration;
use thiserror::Error;

/// Result type alias for scrape operations
pub type ScrapeResult<T> = Result<T, ScrapeError>;

/// Errors raised while building a target set or talking to a target
///
/// Only [`ScrapeError::InvalidAddress`] and [`ScrapeError::NoTargets`] ever
/// reach a caller. The per-target variants are logged and absorbed inside
/// the scrape task that produced them.
#[derive(Error, Debug)]
pub enum ScrapeError {
    /// An address failed the `host:port` shape check
    #[error("invalid address '{addr}': {reason}")]
    InvalidAddress {
        /// Address as supplied
        addr: String,
        /// What was wrong with it
        reason: &'static str,
    },

    /// The target list was empty
    #[error("at least one redis address is required")]
    NoTargets,

    /// Connecting to a target failed
    #[error("connection to {addr} failed: {message}")]
    Connection {
        /// Target address
        addr: String,
        /// Client error text
        message: String,
    },

    /// A command was rejected or its reply was unusable
    #[error("command {command} on {addr} failed: {message}")]
    Command {
        /// Target address
        addr: String,
        /// Command name
        command: String,
        /// Client error text
        message: String,
    },

    /// Connecting or a command round-trip exceeded its deadline
    #[error("{operation} on {addr} timed out after {timeout:?}")]
    Timeout {
        /// Target address
        addr: String,
        /// What was being attempted
        operation: String,
        /// Deadline that elapsed
        timeout: Duration,
    },
}

impl ScrapeError {
    /// Create an InvalidAddress error
    pub fn invalid_address(addr: impl Into<String>, reason: &'static str) -> Self {
        ScrapeError::InvalidAddress {
            addr: addr.into(),
            reason,
        }
    }

    /// Create a Connection error
    pub fn connection(addr: impl Into<String>, message: impl ToString) -> Self {
        ScrapeError::Connection {
            addr: addr.into(),
            message: message.to_string(),
        }
    }

    /// Create a Command error
    pub fn command(
        addr: impl Into<String>,
        command: impl Into<String>,
        message: impl ToString,
    ) -> Self {
        ScrapeError::Command {
            addr: addr.into(),
            command: command.into(),
            message: message.to_string(),
        }
    }

    /// Create a Timeout error
    pub fn timeout(addr: impl Into<String>, operation: impl Into<String>, timeout: Duration) -> Self {
        ScrapeError::Timeout {
            addr: addr.into(),
            operation: operation.into(),
            timeout,
        }
    }

    /// Short machine-friendly kind, used as a log field
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::InvalidAddress { .. } => "invalid_address",
            ScrapeError::NoTargets => "no_targets",
            ScrapeError::Connection { .. } => "connection",
            ScrapeError::Command { .. } => "command",
            ScrapeError::Timeout { .. } => "timeout",
        }
    }
}
