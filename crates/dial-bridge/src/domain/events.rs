//! The relay event channel vocabulary.
//!
//! The source application shape for this service is a GUI app whose
//! framework invokes delegate callbacks from several threads at once.  Here
//! that becomes a single `mpsc` channel of tagged [`RelayEvent`] variants:
//! the device adapter, the WebSocket accept loop, and every per-socket
//! reader task *send*; only the bridge loop *receives*.  One consumer means
//! one writer for all relay state.
//!
//! # Stale-callback guard
//!
//! Device events carry the [`SessionId`] of the connection attempt they
//! belong to.  The bridge allocates a fresh id per attempt and discards any
//! event tagged with a superseded id — a late `Connected` from a session
//! that has already been replaced must not restart the server.

use std::net::SocketAddr;

use tokio::sync::mpsc;
use uuid::Uuid;

use dial_core::{ConnectionState, DeviceDescriptor, GestureEvent, WireMessage};

/// Identifies one device connection attempt.
pub type SessionId = Uuid;

/// Identifies one client WebSocket for the lifetime of its connection.
pub type SocketId = Uuid;

/// The sending side of one client socket.
///
/// Messages pushed here are delivered to the peer in order by the socket's
/// writer task (per-socket FIFO).  Dropping the handle closes the queue,
/// which makes the writer task send a WebSocket Close frame and exit — so
/// "remove from the registry" and "hang up" are the same operation.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    id: SocketId,
    outbound: mpsc::UnboundedSender<WireMessage>,
}

impl ClientHandle {
    /// Wraps the outbound queue of a freshly accepted socket.
    pub fn new(outbound: mpsc::UnboundedSender<WireMessage>) -> Self {
        Self {
            id: Uuid::new_v4(),
            outbound,
        }
    }

    pub fn id(&self) -> SocketId {
        self.id
    }

    /// Enqueues a message for this socket.  Returns `false` when the socket's
    /// writer task is gone — the caller treats that as a dead socket.
    pub fn send(&self, message: WireMessage) -> bool {
        self.outbound.send(message).is_ok()
    }
}

/// Everything that can happen to the relay, as one flat event type.
#[derive(Debug)]
pub enum RelayEvent {
    /// Discovery surfaced a candidate device.
    DeviceFound(DeviceDescriptor),
    /// The device transport reports a connection-state change.
    DeviceState {
        session: SessionId,
        state: ConnectionState,
        /// Human-readable failure reason, for the log only.
        reason: Option<String>,
    },
    /// The device reported a gesture.
    Gesture {
        session: SessionId,
        event: GestureEvent,
    },
    /// The device's firmware revision was read.
    Firmware { session: SessionId, version: String },
    /// The device notified a battery level (raw, clamped on record).
    Battery { session: SessionId, level: u8 },
    /// The WebSocket server is bound and accepting.
    ServerStarted { addr: SocketAddr },
    /// The WebSocket server could not start (e.g. port in use).
    ServerFailed { reason: String },
    /// A client completed the WebSocket handshake.
    ClientOpened(ClientHandle),
    /// A client sent a text frame (a display-matrix command).
    ClientMessage { socket: SocketId, text: String },
    /// A client closed its connection.
    ClientClosed { socket: SocketId },
    /// A client socket failed mid-session.
    ClientFailed { socket: SocketId, reason: String },
    /// External stop request; tears everything down and ends the run loop.
    Shutdown,
}
