// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-connection binding state machine.
//!
//! A connection starts anonymous, becomes bound when it authenticates, and is
//! closed when the transport goes away. Re-authenticating under a different
//! identity moves the connection; it never holds two rooms at once.

use std::fmt;
use std::sync::Arc;

use crate::protocol::{self, AuthenticatePayload, Inbound};
use crate::registry::{BindOutcome, ConnectionHandle, ConnectionId, ConnectionRegistry, Frame};

/// Where a connection is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Anonymous,
    Bound { room: String },
    Closed,
}

/// Reasons an inbound frame was not acted on. None of these end the
/// connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// Not JSON, or an `authenticate` missing required fields.
    Malformed(String),
    UnknownEvent(String),
    /// The session was already closed.
    Closed,
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(reason) => write!(f, "malformed request: {reason}"),
            Self::UnknownEvent(event) => write!(f, "unknown event: {event}"),
            Self::Closed => f.write_str("session closed"),
        }
    }
}

impl std::error::Error for BindingError {}

/// Binding glue between one transport connection and the registry.
///
/// Dropping the session unbinds it, so an aborted connection task cannot
/// leave a stale handle behind.
pub struct BindingSession {
    registry: Arc<ConnectionRegistry>,
    handle: ConnectionHandle,
    phase: SessionPhase,
}

impl BindingSession {
    pub fn new(registry: Arc<ConnectionRegistry>, handle: ConnectionHandle) -> Self {
        Self { registry, handle, phase: SessionPhase::Anonymous }
    }

    pub fn id(&self) -> ConnectionId {
        self.handle.id()
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    /// Handle one inbound text frame. Returns a reply frame to send back to
    /// this connection, if any.
    pub fn handle_text(&mut self, text: &str) -> Result<Option<Frame>, BindingError> {
        if self.phase == SessionPhase::Closed {
            return Err(BindingError::Closed);
        }
        let msg: Inbound =
            serde_json::from_str(text).map_err(|e| BindingError::Malformed(e.to_string()))?;

        match msg.event.as_str() {
            protocol::AUTHENTICATE => {
                let payload: AuthenticatePayload = serde_json::from_value(msg.data)
                    .map_err(|e| BindingError::Malformed(e.to_string()))?;
                let room = self.authenticate(&payload)?;
                match protocol::encode_authenticated(&room) {
                    Ok(frame) => Ok(Some(frame)),
                    Err(e) => {
                        tracing::debug!(conn = %self.id(), err = %e, "failed to encode ack");
                        Ok(None)
                    }
                }
            }
            other => Err(BindingError::UnknownEvent(other.to_owned())),
        }
    }

    /// Bind this connection to the payload's identity. Returns the room key.
    pub fn authenticate(&mut self, payload: &AuthenticatePayload) -> Result<String, BindingError> {
        if self.phase == SessionPhase::Closed {
            return Err(BindingError::Closed);
        }
        if payload.user_id.is_empty() {
            return Err(BindingError::Malformed("userId is empty".to_owned()));
        }

        let room = protocol::room_key(&payload.user_id);
        let game = payload.game_id.as_deref().unwrap_or("");
        match self.registry.bind(&room, self.handle.clone()) {
            BindOutcome::Bound => {
                tracing::info!(room = %room, game, conn = %self.id(), "connection authenticated");
            }
            BindOutcome::Rebound { previous } => {
                tracing::info!(
                    room = %room,
                    previous = %previous,
                    game,
                    conn = %self.id(),
                    "connection re-authenticated"
                );
            }
            BindOutcome::Unchanged => {
                tracing::debug!(room = %room, game, conn = %self.id(), "already bound");
            }
        }
        self.phase = SessionPhase::Bound { room: room.clone() };
        Ok(room)
    }

    /// Unbind and move to `Closed`. Idempotent.
    pub fn close(&mut self) {
        if self.phase == SessionPhase::Closed {
            return;
        }
        self.registry.unbind(self.handle.id());
        self.phase = SessionPhase::Closed;
    }
}

impl Drop for BindingSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
#[path = "binding_tests.rs"]
mod tests;
