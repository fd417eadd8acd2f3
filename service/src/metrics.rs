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

//! Lock-free dispatcher metrics
//!
//! Every recording method updates an in-process atomic (for [`MetricsSnapshot`])
//! and the matching `metrics` facade instrument, so an exporter installed by
//! the binary sees the same numbers.

use crate::SessionOutcome;
use metrics::{counter, gauge, histogram};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Lock-free dispatcher metrics
#[derive(Debug)]
pub struct ServerMetrics {
    // Session counts
    total_sessions: AtomicU64,
    active_sessions: AtomicU64,

    // Outcomes
    completed_sessions: AtomicU64,
    failed_sessions: AtomicU64,

    // Traffic
    lines_received: AtomicU64,
    bytes_received: AtomicU64,
    bytes_sent: AtomicU64,

    // Errors
    accept_errors: AtomicU64,
    idle_timeouts: AtomicU64,

    // Timing (stored as nanoseconds)
    total_session_duration_ns: AtomicU64,

    started_at: Instant,
}

impl Default for ServerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerMetrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            total_sessions: AtomicU64::new(0),
            active_sessions: AtomicU64::new(0),
            completed_sessions: AtomicU64::new(0),
            failed_sessions: AtomicU64::new(0),
            lines_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            accept_errors: AtomicU64::new(0),
            idle_timeouts: AtomicU64::new(0),
            total_session_duration_ns: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    // Session tracking

    /// Record a new session being opened
    pub fn session_opened(&self) {
        self.total_sessions.fetch_add(1, Ordering::Relaxed);
        self.active_sessions.fetch_add(1, Ordering::Relaxed);
        counter!("smsd.sessions.total").increment(1);
        gauge!("smsd.sessions.active").increment(1.0);
    }

    /// Record a session ending
    pub fn session_closed(&self, outcome: SessionOutcome, duration: Duration) {
        self.active_sessions.fetch_sub(1, Ordering::Relaxed);
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        self.total_session_duration_ns
            .fetch_add(nanos, Ordering::Relaxed);
        match outcome {
            SessionOutcome::Failed => {
                self.failed_sessions.fetch_add(1, Ordering::Relaxed);
            }
            SessionOutcome::Completed | SessionOutcome::PeerClosed | SessionOutcome::Shutdown => {
                self.completed_sessions.fetch_add(1, Ordering::Relaxed);
            }
        }
        gauge!("smsd.sessions.active").decrement(1.0);
        counter!("smsd.sessions.closed", "outcome" => outcome.to_string()).increment(1);
        histogram!("smsd.session.duration").record(duration.as_secs_f64());
    }

    /// Get the current number of live sessions
    pub fn active_sessions(&self) -> u64 {
        self.active_sessions.load(Ordering::Relaxed)
    }

    /// Get the total number of sessions since start
    pub fn total_sessions(&self) -> u64 {
        self.total_sessions.load(Ordering::Relaxed)
    }

    // Traffic tracking

    /// Record a complete line read from a peer
    pub fn line_received(&self, bytes: usize) {
        self.lines_received.fetch_add(1, Ordering::Relaxed);
        self.bytes_received
            .fetch_add(bytes as u64, Ordering::Relaxed);
        counter!("smsd.lines.received").increment(1);
    }

    /// Record bytes written to a peer
    pub fn bytes_sent(&self, bytes: usize) {
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
        counter!("smsd.bytes.sent").increment(bytes as u64);
    }

    // Error tracking

    /// Record a failed accept
    pub fn accept_error(&self) {
        self.accept_errors.fetch_add(1, Ordering::Relaxed);
        counter!("smsd.accept.errors").increment(1);
    }

    /// Record a session closed for inactivity
    pub fn idle_timeout(&self) {
        self.idle_timeouts.fetch_add(1, Ordering::Relaxed);
        counter!("smsd.sessions.idle_timeouts").increment(1);
    }

    // Snapshot

    /// Get a point-in-time view of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_sessions: self.total_sessions.load(Ordering::Relaxed),
            active_sessions: self.active_sessions.load(Ordering::Relaxed),
            completed_sessions: self.completed_sessions.load(Ordering::Relaxed),
            failed_sessions: self.failed_sessions.load(Ordering::Relaxed),
            lines_received: self.lines_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            accept_errors: self.accept_errors.load(Ordering::Relaxed),
            idle_timeouts: self.idle_timeouts.load(Ordering::Relaxed),
            uptime: self.started_at.elapsed(),
            avg_session_duration: self.average_session_duration(),
        }
    }

    fn average_session_duration(&self) -> Duration {
        let closed = self.completed_sessions.load(Ordering::Relaxed)
            + self.failed_sessions.load(Ordering::Relaxed);
        if closed == 0 {
            return Duration::ZERO;
        }
        let total_ns = self.total_session_duration_ns.load(Ordering::Relaxed);
        Duration::from_nanos(total_ns / closed)
    }
}

/// A snapshot of dispatcher metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    /// Total sessions since start
    pub total_sessions: u64,
    /// Current live sessions
    pub active_sessions: u64,
    /// Sessions that ended without error
    pub completed_sessions: u64,
    /// Sessions that ended with an error
    pub failed_sessions: u64,
    /// Complete lines read
    pub lines_received: u64,
    /// Bytes read in complete lines
    pub bytes_received: u64,
    /// Bytes written
    pub bytes_sent: u64,
    /// Failed accept calls
    pub accept_errors: u64,
    /// Sessions closed for inactivity
    pub idle_timeouts: u64,
    /// Dispatcher uptime
    pub uptime: Duration,
    /// Average duration of closed sessions
    pub avg_session_duration: Duration,
}

impl MetricsSnapshot {
    /// Sessions closed so far
    pub fn closed_sessions(&self) -> u64 {
        self.completed_sessions + self.failed_sessions
    }
}
