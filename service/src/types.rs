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

//! Core types for the dispatcher

use smsd_config::GatewayConfig;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Unique identifier for a session (monotonically increasing, never reused)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// Create a new session ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying u64 value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sess-{}", self.0)
    }
}

/// Session state (stored as atomic u8 for lock-free state management)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    /// Socket accepted, handler not yet notified
    Open = 0,
    /// Reading lines from the peer
    Active = 1,
    /// Cleanup in progress
    Closing = 2,
    /// Socket released
    Closed = 3,
}

impl SessionState {
    /// Convert from u8 (for atomic operations)
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Open,
            1 => Self::Active,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }

    /// Convert to u8 (for atomic operations)
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Check if the session is in a terminal state
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closing | Self::Closed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Active => write!(f, "active"),
            Self::Closing => write!(f, "closing"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The handler finished the exchange and the server closed the socket
    Completed,
    /// The peer closed cleanly after at least one complete line
    PeerClosed,
    /// The dispatcher asked the session to stop
    Shutdown,
    /// The session ended with a [`SessionError`](crate::SessionError)
    Failed,
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::PeerClosed => write!(f, "peer-closed"),
            Self::Shutdown => write!(f, "shutdown"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Everything a handler may know about the session it serves
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Session ID
    pub id: SessionId,
    /// Peer address
    pub peer_addr: SocketAddr,
    /// When the socket was accepted
    pub created_at: Instant,
    /// Daemon configuration, shared read-only
    pub gateway: Arc<GatewayConfig>,
}

impl SessionContext {
    /// Get the session duration so far
    pub fn duration(&self) -> Duration {
        self.created_at.elapsed()
    }
}

/// Session information snapshot (for non-blocking queries)
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// Session ID
    pub id: SessionId,
    /// Current state
    pub state: SessionState,
    /// Peer address
    pub peer_addr: SocketAddr,
    /// When the socket was accepted
    pub created_at: Instant,
}

impl SessionInfo {
    /// Get the session duration
    pub fn duration(&self) -> Duration {
        self.created_at.elapsed()
    }
}

/// Dispatcher snapshot for non-blocking debug information
#[derive(Debug, Clone)]
pub struct ServerSnapshot {
    /// Number of live sessions
    pub active_sessions: usize,
    /// Total sessions since start
    pub total_sessions: u64,
    /// Listener address
    pub local_addr: SocketAddr,
    /// Dispatcher uptime
    pub uptime: Duration,
    /// Dispatcher start time
    pub started_at: Instant,
}

impl fmt::Display for ServerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Dispatcher {{ active: {}, total: {}, addr: {}, uptime: {:?} }}",
            self.active_sessions, self.total_sessions, self.local_addr, self.uptime
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id() {
        let id1 = SessionId::new(1);
        let id2 = SessionId::new(2);

        assert_eq!(id1.as_u64(), 1);
        assert_ne!(id1, id2);
        assert!(id1 < id2);
        assert_eq!(id2.to_string(), "sess-2");
    }

    #[test]
    fn test_session_state_conversion() {
        for state in [
            SessionState::Open,
            SessionState::Active,
            SessionState::Closing,
            SessionState::Closed,
        ] {
            assert_eq!(SessionState::from_u8(state.as_u8()), state);
        }
        assert_eq!(SessionState::from_u8(200), SessionState::Closed);
    }

    #[test]
    fn test_session_state_terminal() {
        assert!(!SessionState::Open.is_terminal());
        assert!(!SessionState::Active.is_terminal());
        assert!(SessionState::Closing.is_terminal());
        assert!(SessionState::Closed.is_terminal());
    }

    #[test]
    fn test_snapshot_display() {
        let snapshot = ServerSnapshot {
            active_sessions: 2,
            total_sessions: 7,
            local_addr: "127.0.0.1:2775".parse().unwrap(),
            uptime: Duration::from_secs(1),
            started_at: Instant::now(),
        };
        assert_eq!(
            snapshot.to_string(),
            "Dispatcher { active: 2, total: 7, addr: 127.0.0.1:2775, uptime: 1s }"
        );
    }
}
