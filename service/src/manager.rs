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

//! Session manager implementation
//!
//! The SessionManager is responsible for:
//! - Spawning one independent task per accepted socket
//! - Tracking live sessions for snapshots
//! - Cancelling and draining sessions on shutdown
//!
//! Sessions share nothing mutable with each other. The table is only touched
//! when a session starts and when it ends.

use crate::{
    DispatcherConfig, ServerMetrics, SessionContext, SessionHandler, SessionId, SessionInfo,
    SessionState, SessionWorker,
};
use dashmap::DashMap;
use smsd_config::GatewayConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Managed session entry
struct ManagedSession {
    peer_addr: SocketAddr,
    created_at: Instant,
    state: Arc<AtomicU8>,
    cancel: CancellationToken,
}

impl ManagedSession {
    fn info(&self, id: SessionId) -> SessionInfo {
        SessionInfo {
            id,
            state: SessionState::from_u8(self.state.load(Ordering::Acquire)),
            peer_addr: self.peer_addr,
            created_at: self.created_at,
        }
    }
}

/// Session manager
pub struct SessionManager {
    sessions: Arc<DashMap<SessionId, ManagedSession>>,
    next_id: AtomicU64,
    metrics: Arc<ServerMetrics>,
    config: DispatcherConfig,
    /// Parent of every session's cancellation token
    shutdown: CancellationToken,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(
        metrics: Arc<ServerMetrics>,
        config: DispatcherConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(1),
            metrics,
            config,
            shutdown,
        }
    }

    fn next_session_id(&self) -> SessionId {
        SessionId::new(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Spawn a session task for an accepted socket
    ///
    /// Returns immediately; the caller never waits on session work.
    pub fn spawn_session(
        &self,
        stream: TcpStream,
        peer_addr: SocketAddr,
        handler: Arc<dyn SessionHandler>,
        gateway: Arc<GatewayConfig>,
    ) -> SessionId {
        let id = self.next_session_id();
        let created_at = Instant::now();
        let state = Arc::new(AtomicU8::new(SessionState::Open.as_u8()));
        let cancel = self.shutdown.child_token();

        // Tracked before the task exists so a fast session cannot finish
        // before its entry is inserted.
        self.sessions.insert(
            id,
            ManagedSession {
                peer_addr,
                created_at,
                state: state.clone(),
                cancel: cancel.clone(),
            },
        );
        self.metrics.session_opened();

        let ctx = SessionContext {
            id,
            peer_addr,
            created_at,
            gateway,
        };
        let worker = SessionWorker::new(
            ctx,
            stream,
            handler,
            self.config.clone(),
            self.metrics.clone(),
            state,
            cancel,
        );

        let sessions = self.sessions.clone();
        let metrics = self.metrics.clone();
        let span = tracing::info_span!("session", id = %id, peer = %peer_addr);
        tokio::spawn(
            async move {
                let outcome = worker.run().await;
                sessions.remove(&id);
                metrics.session_closed(outcome, created_at.elapsed());
            }
            .instrument(span),
        );

        id
    }

    /// Ask one session to close
    ///
    /// Returns false if the session is gone or already closing.
    pub fn close_session(&self, id: SessionId) -> bool {
        match self.sessions.get(&id) {
            Some(entry) if !entry.info(id).state.is_terminal() => {
                entry.cancel.cancel();
                true
            }
            _ => false,
        }
    }

    /// Get session info
    pub fn session_info(&self, id: SessionId) -> Option<SessionInfo> {
        self.sessions.get(&id).map(|entry| entry.info(id))
    }

    /// Get all live session IDs
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|entry| *entry.key()).collect()
    }

    /// Get info for every live session
    pub fn all_session_infos(&self) -> Vec<SessionInfo> {
        self.sessions
            .iter()
            .map(|entry| entry.value().info(*entry.key()))
            .collect()
    }

    /// Get the number of live sessions
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Cancel every session and wait for them to drain
    ///
    /// Returns the number of sessions still live when `grace` ran out.
    pub async fn shutdown(&self, grace: Duration) -> usize {
        self.shutdown.cancel();

        let drained = tokio::time::timeout(grace, async {
            while !self.sessions.is_empty() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;

        match drained {
            Ok(()) => 0,
            Err(_) => {
                let remaining = self.sessions.len();
                tracing::warn!(remaining, "sessions still open after shutdown grace period");
                remaining
            }
        }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("session_count", &self.session_count())
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish()
    }
}
