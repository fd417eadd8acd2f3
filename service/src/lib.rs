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

//! smsd Connection Dispatcher
//!
//! Accepts ESME connections on the daemon's configured address and runs one
//! isolated session task per socket:
//!
//! - The accept loop never waits on session work
//! - A slow or silent peer only holds its own task, bounded by an idle timeout
//! - Accept failures back off exponentially instead of spinning
//! - Every socket is released exactly once, on every exit path
//!
//! # Architecture
//!
//! ```text
//! Dispatcher (accept loop)
//!     ↓
//! SessionManager
//!     ↓
//! SessionWorker → Framed<TcpStream, LineCodec> → SessionHandler
//! ```
//!
//! The session protocol is pluggable through [`SessionHandler`]. The stock
//! [`EchoHandler`] echoes the first line back and closes.
//!
//! # Example
//!
//! ```no_run
//! use smsd_config::GatewayConfig;
//! use smsd_service::{Dispatcher, EchoHandler};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(GatewayConfig::load("./settings.toml")?);
//!     let dispatcher = Dispatcher::new(config).await?;
//!     dispatcher.start(Arc::new(EchoHandler::new())).await?;
//!     tokio::signal::ctrl_c().await?;
//!     dispatcher.shutdown().await?;
//!     Ok(())
//! }
//! ```

mod backoff;
mod codec;
mod config;
mod error;
mod handler;
mod manager;
mod metrics;
mod server;
mod session;
mod types;

pub use backoff::AcceptBackoff;
pub use codec::LineCodec;
pub use config::DispatcherConfig;
pub use error::{Result, ServiceError, SessionError};
pub use handler::{EchoHandler, SessionAction, SessionHandler};
pub use manager::SessionManager;
pub use metrics::{MetricsSnapshot, ServerMetrics};
pub use server::Dispatcher;
pub use session::SessionWorker;
pub use types::{
    ServerSnapshot, SessionContext, SessionId, SessionInfo, SessionOutcome, SessionState,
};
