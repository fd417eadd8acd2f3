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

//! Connection dispatcher
//!
//! The Dispatcher owns the listening socket, runs the accept loop and hands
//! every accepted socket to the SessionManager.

use crate::{
    AcceptBackoff, DispatcherConfig, Result, ServerMetrics, ServerSnapshot, ServiceError,
    SessionHandler, SessionManager,
};
use smsd_config::GatewayConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Connection dispatcher
///
/// Accepts ESME connections and runs one isolated session per socket.
///
/// # Example
///
/// ```no_run
/// use smsd_config::GatewayConfig;
/// use smsd_service::{Dispatcher, EchoHandler};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Arc::new(GatewayConfig::load("./settings.toml")?);
///     let dispatcher = Dispatcher::new(config).await?;
///
///     dispatcher.start(Arc::new(EchoHandler::new())).await?;
///     tokio::signal::ctrl_c().await?;
///     dispatcher.shutdown().await?;
///
///     Ok(())
/// }
/// ```
pub struct Dispatcher {
    /// Daemon configuration
    gateway: Arc<GatewayConfig>,
    /// Dispatcher timing
    config: DispatcherConfig,
    /// Session manager
    manager: Arc<SessionManager>,
    /// Dispatcher metrics
    metrics: Arc<ServerMetrics>,
    /// Listening socket, moved into the accept loop on start
    listener: Mutex<Option<TcpListener>>,
    /// Actual bind address
    local_addr: SocketAddr,
    /// Dispatcher start time
    started_at: Instant,
    /// Running flag
    running: AtomicBool,
    /// Cancelled on shutdown; parent of every session token
    shutdown: CancellationToken,
    /// Accept loop task handle
    accept_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Dispatcher {
    /// Bind the listener using the daemon configuration's `[server]` timing
    pub async fn new(gateway: Arc<GatewayConfig>) -> Result<Self> {
        let config = DispatcherConfig::from(&gateway.server);
        Self::with_config(gateway, config).await
    }

    /// Bind the listener with explicit dispatcher timing
    ///
    /// This binds to `host:port` but does not start accepting connections.
    /// Call `start()` to begin accepting.
    pub async fn with_config(gateway: Arc<GatewayConfig>, config: DispatcherConfig) -> Result<Self> {
        config.validate().map_err(ServiceError::InvalidConfig)?;

        let address = gateway.bind_address();
        let listener = TcpListener::bind(address.as_str())
            .await
            .map_err(|source| ServiceError::Bind {
                address: address.clone(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        let metrics = Arc::new(ServerMetrics::new());
        let shutdown = CancellationToken::new();
        let manager = Arc::new(SessionManager::new(
            metrics.clone(),
            config.clone(),
            shutdown.child_token(),
        ));

        tracing::info!(address = %local_addr, "listener bound");

        Ok(Self {
            gateway,
            config,
            manager,
            metrics,
            listener: Mutex::new(Some(listener)),
            local_addr,
            started_at: Instant::now(),
            running: AtomicBool::new(false),
            shutdown,
            accept_handle: Mutex::new(None),
        })
    }

    /// Start accepting connections with the given handler
    ///
    /// The accept loop runs on its own task until `shutdown()` is called.
    pub async fn start(&self, handler: Arc<dyn SessionHandler>) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ServiceError::AlreadyRunning);
        }

        let Some(listener) = self.listener.lock().await.take() else {
            self.running.store(false, Ordering::SeqCst);
            return Err(ServiceError::ListenerClosed);
        };

        tracing::info!(
            address = %self.local_addr,
            esmes = self.gateway.active_esmes().count(),
            "smsd is running"
        );

        let handle = tokio::spawn(
            accept_loop(
                listener,
                handler,
                self.gateway.clone(),
                self.manager.clone(),
                self.metrics.clone(),
                AcceptBackoff::new(
                    self.config.accept_backoff_initial,
                    self.config.accept_backoff_max,
                ),
                self.shutdown.clone(),
            )
            .in_current_span(),
        );
        *self.accept_handle.lock().await = Some(handle);

        Ok(())
    }

    /// Shutdown the dispatcher gracefully
    ///
    /// Stops accepting, cancels every live session and waits up to the
    /// configured shutdown timeout for them to finish.
    pub async fn shutdown(&self) -> Result<()> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Err(ServiceError::NotRunning);
        }

        tracing::info!("shutting down dispatcher");
        self.shutdown.cancel();

        if let Some(mut handle) = self.accept_handle.lock().await.take() {
            match tokio::time::timeout(self.config.shutdown_timeout, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "accept loop task failed"),
                Err(_) => {
                    tracing::warn!(
                        timeout = ?self.config.shutdown_timeout,
                        "accept loop did not stop within the shutdown timeout, aborting it"
                    );
                    handle.abort();
                }
            }
        }

        let remaining = self.manager.shutdown(self.config.shutdown_timeout).await;

        tracing::info!(remaining, "dispatcher shutdown complete");
        Ok(())
    }

    /// Check if the dispatcher is accepting connections
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the listener's bound address
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Get the number of live sessions
    pub fn session_count(&self) -> usize {
        self.manager.session_count()
    }

    /// Get a snapshot of the dispatcher state
    pub fn snapshot(&self) -> ServerSnapshot {
        ServerSnapshot {
            active_sessions: self.manager.session_count(),
            total_sessions: self.metrics.total_sessions(),
            local_addr: self.local_addr,
            uptime: self.started_at.elapsed(),
            started_at: self.started_at,
        }
    }

    /// Get the dispatcher metrics
    pub fn metrics(&self) -> Arc<ServerMetrics> {
        self.metrics.clone()
    }

    /// Get the dispatcher timing
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }
}

/// Accept connections until cancelled.
///
/// Never awaits session work. A failed accept is logged and retried after an
/// exponential backoff.
async fn accept_loop(
    listener: TcpListener,
    handler: Arc<dyn SessionHandler>,
    gateway: Arc<GatewayConfig>,
    manager: Arc<SessionManager>,
    metrics: Arc<ServerMetrics>,
    mut backoff: AcceptBackoff,
    shutdown: CancellationToken,
) {
    loop {
        let accepted = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => accepted,
        };

        match accepted {
            Ok((stream, peer_addr)) => {
                backoff.reset();
                let id = manager.spawn_session(stream, peer_addr, handler.clone(), gateway.clone());
                tracing::debug!(session = %id, peer = %peer_addr, "connection accepted");
            }
            Err(e) => {
                metrics.accept_error();
                let delay = backoff.next_delay();
                tracing::error!(
                    error = %e,
                    failures = backoff.failures(),
                    retry_in = ?delay,
                    "Failed accepting a connection request"
                );

                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }

    tracing::info!("accept loop terminated");
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("local_addr", &self.local_addr)
            .field("running", &self.is_running())
            .field("session_count", &self.session_count())
            .field("uptime", &self.started_at.elapsed())
            .finish()
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        if self.running.load(Ordering::SeqCst) {
            tracing::warn!("Dispatcher dropped while still running");
            self.running.store(false, Ordering::SeqCst);
        }
        self.shutdown.cancel();
    }
}
