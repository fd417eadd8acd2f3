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

//! Session worker implementation
//!
//! A SessionWorker owns one accepted socket for its whole life:
//! - Line framing and the idle timeout
//! - Dispatching lines to the [`SessionHandler`]
//! - Writing replies under the write timeout
//! - Releasing the socket on every exit path

use crate::{
    DispatcherConfig, LineCodec, ServerMetrics, SessionAction, SessionContext, SessionError,
    SessionHandler, SessionOutcome, SessionState,
};
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::net::TcpStream;
use tokio::select;
use tokio::time::timeout;
use tokio_util::codec::Framed;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// Worker that runs a single session to completion
pub struct SessionWorker {
    ctx: SessionContext,
    framed: Framed<TcpStream, LineCodec>,
    handler: Arc<dyn SessionHandler>,
    config: DispatcherConfig,
    metrics: Arc<ServerMetrics>,
    /// Shared with the session table for lock-free snapshots
    state: Arc<AtomicU8>,
    cancel: CancellationToken,
    lines: u64,
}

impl SessionWorker {
    /// Create a new session worker
    pub fn new(
        ctx: SessionContext,
        stream: TcpStream,
        handler: Arc<dyn SessionHandler>,
        config: DispatcherConfig,
        metrics: Arc<ServerMetrics>,
        state: Arc<AtomicU8>,
        cancel: CancellationToken,
    ) -> Self {
        let framed = Framed::new(stream, LineCodec::new(config.max_line_length));
        Self {
            ctx,
            framed,
            handler,
            config,
            metrics,
            state,
            cancel,
            lines: 0,
        }
    }

    /// Get the current state
    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, new_state: SessionState) {
        self.state.store(new_state.as_u8(), Ordering::Release);
    }

    /// Run the session until it completes, fails or is cancelled
    ///
    /// The socket is owned by the worker and is released when this returns.
    pub async fn run(mut self) -> SessionOutcome {
        self.set_state(SessionState::Active);
        self.handler.on_connect(&self.ctx).await;

        let outcome = match self.event_loop().await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.report(&e);
                self.handler.on_error(&self.ctx, &e).await;
                SessionOutcome::Failed
            }
        };

        self.cleanup(outcome).await;
        outcome
    }

    async fn event_loop(&mut self) -> Result<SessionOutcome, SessionError> {
        loop {
            let frame = select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(SessionOutcome::Shutdown),
                frame = timeout(self.config.idle_timeout, self.framed.next()) => frame,
            };

            let line = match frame {
                Ok(Some(Ok(line))) => line,
                Ok(Some(Err(e))) => return Err(e),
                Ok(None) if self.lines == 0 => return Err(SessionError::PeerClosed),
                Ok(None) => return Ok(SessionOutcome::PeerClosed),
                Err(_) => return Err(SessionError::IdleTimeout(self.config.idle_timeout)),
            };

            self.lines += 1;
            self.metrics.line_received(line.len());
            debug!(session = %self.ctx.id, bytes = line.len(), "line received");

            match self.handler.on_line(&self.ctx, line).await {
                SessionAction::Continue => {}
                SessionAction::Reply(reply) => self.send(reply).await?,
                SessionAction::ReplyAndClose(reply) => {
                    self.send(reply).await?;
                    return Ok(SessionOutcome::Completed);
                }
                SessionAction::Close => return Ok(SessionOutcome::Completed),
            }
        }
    }

    async fn send(&mut self, reply: Bytes) -> Result<(), SessionError> {
        let len = reply.len();
        match timeout(self.config.write_timeout, self.framed.send(reply)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(SessionError::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "write timed out",
                )));
            }
        }
        self.metrics.bytes_sent(len);
        Ok(())
    }

    fn report(&self, e: &SessionError) {
        let peer = self.ctx.peer_addr;
        match e {
            e if e.is_peer_close() => {
                error!(session = %self.ctx.id, peer = %peer, error = %e, "Reached end of stream, closing session");
            }
            e if e.is_transport_error() => {
                error!(session = %self.ctx.id, peer = %peer, error = %e, "Transport error, closing session");
            }
            SessionError::IdleTimeout(_) => {
                self.metrics.idle_timeout();
                warn!(session = %self.ctx.id, peer = %peer, error = %e, "Session idle, closing");
            }
            _ => {
                error!(session = %self.ctx.id, peer = %peer, error = %e, "Line too long, closing session");
            }
        }
    }

    async fn cleanup(&mut self, outcome: SessionOutcome) {
        self.set_state(SessionState::Closing);

        // Flush anything pending and send FIN before the socket is dropped.
        if let Ok(Err(e)) = timeout(
            self.config.write_timeout,
            SinkExt::<Bytes>::close(&mut self.framed),
        )
        .await
        {
            debug!(session = %self.ctx.id, error = %e, "shutdown of write half failed");
        }

        self.handler.on_disconnect(&self.ctx, outcome).await;
        self.set_state(SessionState::Closed);

        debug!(
            session = %self.ctx.id,
            peer = %self.ctx.peer_addr,
            outcome = %outcome,
            lines = self.lines,
            duration = ?self.ctx.duration(),
            "session closed"
        );
    }
}

impl std::fmt::Debug for SessionWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionWorker")
            .field("id", &self.ctx.id)
            .field("peer_addr", &self.ctx.peer_addr)
            .field("state", &self.state())
            .field("lines", &self.lines)
            .finish()
    }
}
