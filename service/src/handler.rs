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

//! Session handler trait and the stock echo handler

use crate::{SessionContext, SessionError, SessionOutcome};
use async_trait::async_trait;
use bytes::Bytes;

/// What a session should do after a line has been handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Keep reading
    Continue,
    /// Write the bytes and keep reading
    Reply(Bytes),
    /// Write the bytes, then close the session
    ReplyAndClose(Bytes),
    /// Close the session without writing
    Close,
}

/// Session event handler trait
///
/// Implement this trait to give sessions their protocol. One handler instance
/// is shared by every session, so implementations must not keep per-session
/// state outside of what [`SessionContext`] identifies.
///
/// # Example
///
/// ```no_run
/// use smsd_service::{SessionAction, SessionContext, SessionHandler};
/// use async_trait::async_trait;
/// use bytes::Bytes;
///
/// struct Uppercase;
///
/// #[async_trait]
/// impl SessionHandler for Uppercase {
///     async fn on_line(&self, _ctx: &SessionContext, line: Bytes) -> SessionAction {
///         SessionAction::Reply(Bytes::from(line.to_ascii_uppercase()))
///     }
/// }
/// ```
#[async_trait]
pub trait SessionHandler: Send + Sync + 'static {
    /// Called once after the socket is accepted, before any line is read
    async fn on_connect(&self, _ctx: &SessionContext) {}

    /// Called for every complete line, terminator included
    async fn on_line(&self, ctx: &SessionContext, line: Bytes) -> SessionAction;

    /// Called when the session ends with an error
    ///
    /// The socket is released after this method returns.
    async fn on_error(&self, _ctx: &SessionContext, _error: &SessionError) {}

    /// Called exactly once when the session ends, whatever the reason
    async fn on_disconnect(&self, _ctx: &SessionContext, _outcome: SessionOutcome) {}
}

/// Placeholder protocol: echo the first line back and close
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoHandler;

impl EchoHandler {
    /// Create a new echo handler
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SessionHandler for EchoHandler {
    async fn on_line(&self, _ctx: &SessionContext, line: Bytes) -> SessionAction {
        SessionAction::ReplyAndClose(line)
    }
}
