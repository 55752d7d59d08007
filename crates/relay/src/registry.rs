// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Room-addressed connection registry.
//!
//! Maps a room key (a namespaced identity such as `user:alice`) to the live
//! connections currently bound to it. Handles are weak: the registry holds a
//! downgraded sender, so a connection's outbound channel closes as soon as its
//! transport task drops the strong side, whether or not `unbind` has run yet.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// A pre-serialized outbound frame, shared across every recipient.
pub type Frame = Arc<str>;

/// Transport-assigned identifier for one persistent connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Why a single-connection send did not go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// The connection's outbound queue is at capacity.
    Full,
    /// The connection's transport task has gone away.
    Closed,
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => f.write_str("outbound queue full"),
            Self::Closed => f.write_str("connection closed"),
        }
    }
}

impl std::error::Error for SendError {}

/// Non-owning handle to one live connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    tx: mpsc::WeakSender<Frame>,
}

impl ConnectionHandle {
    /// Wrap the transport's outbound sender. Only a weak reference is kept.
    pub fn new(id: ConnectionId, tx: &mpsc::Sender<Frame>) -> Self {
        Self { id, tx: tx.downgrade() }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a frame without waiting.
    pub fn send(&self, frame: Frame) -> Result<(), SendError> {
        let tx = self.tx.upgrade().ok_or(SendError::Closed)?;
        tx.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => SendError::Full,
            TrySendError::Closed(_) => SendError::Closed,
        })
    }
}

/// Result of [`ConnectionRegistry::bind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOutcome {
    Bound,
    /// The connection was already bound to this room.
    Unchanged,
    /// The connection moved here from `previous`.
    Rebound { previous: String },
}

/// Result of [`ConnectionRegistry::broadcast`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Connections in the snapshot the frame was dispatched to.
    pub sent_to: usize,
    /// Of those, how many rejected the frame.
    pub failed: usize,
}

/// Point-in-time registry counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub rooms: usize,
    pub connections: usize,
}

#[derive(Default)]
struct Inner {
    rooms: HashMap<String, IndexMap<ConnectionId, ConnectionHandle>>,
    /// Reverse index: which room each connection is bound to.
    owners: HashMap<ConnectionId, String>,
}

impl Inner {
    fn detach(&mut self, id: ConnectionId) -> Option<String> {
        let room = self.owners.remove(&id)?;
        if let Some(members) = self.rooms.get_mut(&room) {
            members.shift_remove(&id);
            if members.is_empty() {
                self.rooms.remove(&room);
            }
        }
        Some(room)
    }
}

/// Shared room → connections map. One lock guards the whole map; sends happen
/// outside it on a snapshot.
#[derive(Default)]
pub struct ConnectionRegistry {
    inner: Mutex<Inner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handle` to `room`, first removing it from any other room.
    pub fn bind(&self, room: &str, handle: ConnectionHandle) -> BindOutcome {
        let id = handle.id();
        let mut inner = self.inner.lock();

        let outcome = match inner.owners.get(&id).cloned() {
            Some(current) if current == room => return BindOutcome::Unchanged,
            Some(previous) => {
                inner.detach(id);
                BindOutcome::Rebound { previous }
            }
            None => BindOutcome::Bound,
        };

        inner.rooms.entry(room.to_owned()).or_default().insert(id, handle);
        inner.owners.insert(id, room.to_owned());
        outcome
    }

    /// Remove a connection from whatever room holds it. Safe to call for
    /// connections that were never bound. Returns the room it left.
    pub fn unbind(&self, id: ConnectionId) -> Option<String> {
        self.inner.lock().detach(id)
    }

    /// Snapshot of the handles currently bound to `room`.
    pub fn lookup(&self, room: &str) -> Vec<ConnectionHandle> {
        let inner = self.inner.lock();
        inner.rooms.get(room).map(|m| m.values().cloned().collect()).unwrap_or_default()
    }

    /// The room a connection is bound to, if any.
    pub fn room_of(&self, id: ConnectionId) -> Option<String> {
        self.inner.lock().owners.get(&id).cloned()
    }

    /// Send `frame` to every connection bound to `room`.
    ///
    /// Each send is a non-blocking enqueue. A failed send is logged and
    /// skipped; it still counts toward `sent_to`.
    pub fn broadcast(&self, room: &str, frame: Frame) -> Delivery {
        let snapshot = self.lookup(room);
        let mut delivery = Delivery { sent_to: snapshot.len(), failed: 0 };

        for handle in &snapshot {
            if let Err(e) = handle.send(Arc::clone(&frame)) {
                delivery.failed += 1;
                tracing::debug!(room, conn = %handle.id(), err = %e, "relay send failed");
            }
        }
        delivery
    }

    pub fn stats(&self) -> RegistryStats {
        let inner = self.inner.lock();
        RegistryStats { rooms: inner.rooms.len(), connections: inner.owners.len() }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
