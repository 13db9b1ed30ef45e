//! The client socket registry.
//!
//! Tracks the set of currently open client sockets and fans messages out to
//! them.  Uniqueness is by socket id; insertion order is irrelevant.  A
//! socket whose send queue is gone is removed the moment a send discovers
//! it, and a per-socket failure never aborts delivery to the remaining
//! sockets.
//!
//! All mutation happens on the bridge loop — the registry itself needs no
//! lock.

use std::collections::HashMap;

use tracing::{debug, warn};

use dial_core::WireMessage;

use crate::domain::events::{ClientHandle, SocketId};

/// In-memory set of live client sockets.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: HashMap<SocketId, ClientHandle>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn contains(&self, socket: SocketId) -> bool {
        self.clients.contains_key(&socket)
    }

    /// Registers a socket.  Returns `true` when the socket was new; a
    /// duplicate id replaces the stored handle but the socket still appears
    /// exactly once.
    pub fn add(&mut self, handle: ClientHandle) -> bool {
        let socket = handle.id();
        let replaced = self.clients.insert(socket, handle);
        if replaced.is_some() {
            warn!(%socket, "socket id re-registered; replacing stale handle");
        }
        replaced.is_none()
    }

    /// Removes a socket.  Absent ids are a no-op, not an error.
    pub fn remove(&mut self, socket: SocketId) -> bool {
        let removed = self.clients.remove(&socket).is_some();
        if removed {
            debug!(%socket, remaining = self.clients.len(), "client removed");
        }
        removed
    }

    /// Drops every handle, hanging up all clients.
    pub fn clear(&mut self) {
        if !self.clients.is_empty() {
            debug!(count = self.clients.len(), "clearing client registry");
        }
        self.clients.clear();
    }

    /// Sends to one socket.  A dead socket is removed and `false` returned.
    pub fn send_to(&mut self, socket: SocketId, message: &WireMessage) -> bool {
        let delivered = match self.clients.get(&socket) {
            Some(handle) => handle.send(message.clone()),
            None => return false,
        };
        if !delivered {
            warn!(%socket, "send failed; removing client");
            self.clients.remove(&socket);
        }
        delivered
    }

    /// Sends `message` to every registered socket.
    ///
    /// Sockets whose queue is gone are removed after the sweep; the failure
    /// of one socket does not stop delivery to the others.  Returns the
    /// number of sockets that received the message.
    pub fn broadcast(&mut self, message: &WireMessage) -> usize {
        let mut dead: Vec<SocketId> = Vec::new();
        let mut delivered = 0;

        for (socket, handle) in &self.clients {
            if handle.send(message.clone()) {
                delivered += 1;
            } else {
                warn!(socket = %socket, "send failed during broadcast; removing client");
                dead.push(*socket);
            }
        }
        for socket in dead {
            self.clients.remove(&socket);
        }

        delivered
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
