//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Error types for the dispatcher and its sessions

use std::time::Duration;
use thiserror::Error;

/// Result type for dispatcher operations
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Dispatcher error types
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The listening socket could not be bound
    #[error("failed to bind listener on {address}: {source}")]
    Bind {
        /// Requested `host:port`
        address: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// I/O error outside of a session
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Dispatcher was started twice
    #[error("Dispatcher already running")]
    AlreadyRunning,

    /// Dispatcher is not running
    #[error("Dispatcher not running")]
    NotRunning,

    /// The listener was consumed by an earlier run and cannot be reused
    #[error("Listener already closed")]
    ListenerClosed,

    /// Dispatcher timing is unusable
    #[error("Invalid dispatcher configuration: {0}")]
    InvalidConfig(String),
}

/// Per-session error types
///
/// These end a single session and never affect the listener or other
/// sessions.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Peer closed the connection cleanly without sending anything
    #[error("peer closed the connection before sending a line")]
    PeerClosed,

    /// Peer closed the connection part way through a line
    #[error("peer closed the connection with {buffered} bytes of an unterminated line")]
    Truncated {
        /// Bytes received after the last terminator
        buffered: usize,
    },

    /// A line grew past the configured limit without a terminator
    #[error("line exceeds {limit} bytes")]
    LineTooLong {
        /// Configured maximum line length
        limit: usize,
    },

    /// No complete line arrived within the idle timeout
    #[error("no complete line within {0:?}")]
    IdleTimeout(Duration),

    /// Transport failure while reading or writing
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    /// Check if the peer ended the session by closing its side
    pub fn is_peer_close(&self) -> bool {
        matches!(
            self,
            SessionError::PeerClosed | SessionError::Truncated { .. }
        )
    }

    /// Check if the error came from the transport rather than the peer's data
    pub fn is_transport_error(&self) -> bool {
        matches!(self, SessionError::Io(_))
    }
}
