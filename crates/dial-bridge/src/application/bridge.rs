//! The relay bridge: the lifecycle state machine at the centre of the
//! service.
//!
//! One bridge owns one (optional) device session, the client registry, and
//! the socket-server handle, and consumes the relay event channel:
//!
//! ```text
//!            ┌────────────┐  eligible device found   ┌────────────┐
//!   start ──►│ Discovering│ ────────────────────────►│ Connecting │
//!            └────────────┘                          └─────┬──────┘
//!                  ▲   ▲          connect failed           │ connected
//!                  │   └───────────────────────────────────┤
//!                  │       device lost / invalidated       ▼
//!                  │                              ┌──────────────────┐
//!                  └──────────────────────────────│ Connected        │
//!                        (server stopped,         │ {server_running} │
//!                         registry cleared)       └──────────────────┘
//!
//!   any phase + Shutdown ──► Disconnecting ──► Idle (run loop ends)
//! ```
//!
//! The socket server is started only on entry to `Connected` and stopped on
//! every exit from it, so "device connected" and "clients can be attached"
//! are the same condition.  Device events are trusted only when their
//! session id matches the current session; anything else is a stale callback
//! from a superseded connection attempt and is dropped.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use dial_core::{
    encode_gesture, ConnectionState, DeviceDescriptor, DeviceSnapshot, GestureEvent,
    MatrixCommand, WireMessage,
};

use crate::application::registry::ClientRegistry;
use crate::domain::config::RelayConfig;
use crate::domain::events::{RelayEvent, SessionId};
use crate::infrastructure::device::{DeviceConnector, DeviceControl, DeviceDiscovery};
use crate::infrastructure::socket::SocketServer;

/// Lifecycle phase of the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgePhase {
    /// Not running; the state after an explicit shutdown.
    Idle,
    /// Scanning for an eligible device.
    Discovering,
    /// A connection attempt is in flight.
    Connecting,
    /// Device connected.  `server_running` tracks whether the socket server
    /// actually came up — a failed bind leaves it `false` without leaving
    /// the phase.
    Connected { server_running: bool },
    /// Transitional: tearing down device and server.
    Disconnecting,
}

/// The orchestrator.  Constructed once, then driven by [`RelayBridge::run`]
/// (or [`RelayBridge::handle_event`] directly in tests).
pub struct RelayBridge {
    phase: BridgePhase,
    config: RelayConfig,
    discovery: Box<dyn DeviceDiscovery>,
    connector: Box<dyn DeviceConnector>,
    server: Box<dyn SocketServer>,
    device: Option<Box<dyn DeviceControl>>,
    session: Option<SessionId>,
    snapshot: DeviceSnapshot,
    registry: ClientRegistry,
    events: mpsc::Receiver<RelayEvent>,
}

impl RelayBridge {
    pub fn new(
        config: RelayConfig,
        discovery: Box<dyn DeviceDiscovery>,
        connector: Box<dyn DeviceConnector>,
        server: Box<dyn SocketServer>,
        events: mpsc::Receiver<RelayEvent>,
    ) -> Self {
        Self {
            phase: BridgePhase::Idle,
            config,
            discovery,
            connector,
            server,
            device: None,
            session: None,
            snapshot: DeviceSnapshot::new(),
            registry: ClientRegistry::new(),
            events,
        }
    }

    pub fn phase(&self) -> BridgePhase {
        self.phase
    }

    pub fn client_count(&self) -> usize {
        self.registry.len()
    }

    pub fn snapshot(&self) -> &DeviceSnapshot {
        &self.snapshot
    }

    /// Enters `Discovering` from `Idle`.  Called once at the top of
    /// [`run`](Self::run); harmless if repeated.
    pub fn start(&mut self) {
        if self.phase != BridgePhase::Idle {
            return;
        }
        self.enter_discovering();
    }

    /// Consumes the event channel until shutdown.
    pub async fn run(mut self) -> anyhow::Result<()> {
        self.start();
        while let Some(event) = self.events.recv().await {
            if !self.handle_event(event) {
                break;
            }
        }
        info!("relay bridge stopped");
        Ok(())
    }

    /// Processes one relay event.  Returns `false` once the bridge has shut
    /// down and the run loop should end.
    ///
    /// This is the single-writer entry point: *all* phase transitions and
    /// registry mutations happen inside this call.
    pub fn handle_event(&mut self, event: RelayEvent) -> bool {
        match event {
            RelayEvent::DeviceFound(descriptor) => self.on_device_found(descriptor),

            RelayEvent::DeviceState {
                session,
                state,
                reason,
            } => self.on_device_state(session, state, reason),

            RelayEvent::Gesture { session, event } => self.on_gesture(session, event),

            RelayEvent::Firmware { session, version } => {
                if self.is_current(session) {
                    info!(%version, "device firmware");
                    self.snapshot.record_firmware(version.clone());
                    self.registry.broadcast(&WireMessage::Firmware(version));
                }
            }

            RelayEvent::Battery { session, level } => {
                if self.is_current(session) {
                    self.snapshot.record_battery(level);
                    self.registry.broadcast(&WireMessage::Battery(level.min(100)));
                }
            }

            RelayEvent::ServerStarted { addr } => match self.phase {
                BridgePhase::Connected { .. } => {
                    info!(%addr, "socket server running");
                    self.phase = BridgePhase::Connected {
                        server_running: true,
                    };
                }
                _ => {
                    // The device went away while the bind was in flight.
                    warn!(%addr, "socket server started after device was lost; stopping it");
                    self.server.stop();
                }
            },

            RelayEvent::ServerFailed { reason } => {
                warn!(%reason, "socket server failed to start");
                // No server, no clients.
                self.registry.clear();
                if let BridgePhase::Connected { .. } = self.phase {
                    self.phase = BridgePhase::Connected {
                        server_running: false,
                    };
                }
            }

            RelayEvent::ClientOpened(handle) => {
                if matches!(self.phase, BridgePhase::Connected { .. }) {
                    let socket = handle.id();
                    self.registry.add(handle);
                    // Late-joiner snapshot replay: firmware then battery,
                    // to this socket only, before any later broadcast can
                    // reach it.
                    for message in self.snapshot.replay() {
                        self.registry.send_to(socket, &message);
                    }
                    info!(%socket, clients = self.registry.len(), "client joined");
                } else {
                    // Dropping the handle hangs the socket up.
                    debug!("client opened while no device is connected; dropping");
                }
            }

            RelayEvent::ClientMessage { socket, text } => match self.device.as_mut() {
                Some(device) => {
                    debug!(%socket, bytes = text.len(), "forwarding display command");
                    device.send_matrix(MatrixCommand::new(text));
                }
                None => debug!(%socket, "display command with no device session; dropped"),
            },

            RelayEvent::ClientClosed { socket } => {
                self.registry.remove(socket);
            }

            RelayEvent::ClientFailed { socket, reason } => {
                warn!(%socket, %reason, "client socket failed");
                self.registry.remove(socket);
            }

            RelayEvent::Shutdown => {
                info!("shutdown requested");
                self.teardown();
                return false;
            }
        }
        true
    }

    /// Re-invokes a failed server start.  The recovery path for a bind
    /// failure; a no-op unless the bridge is `Connected` with the server
    /// down.
    pub fn retry_server_start(&mut self) {
        if let BridgePhase::Connected {
            server_running: false,
        } = self.phase
        {
            info!("retrying socket server start");
            self.server.start();
        }
    }

    // ── Event handlers ────────────────────────────────────────────────────────

    fn on_device_found(&mut self, descriptor: DeviceDescriptor) {
        if self.phase != BridgePhase::Discovering {
            debug!(device = %descriptor.id, "device found outside discovery; ignored");
            return;
        }
        if !self.name_matches(&descriptor.name) {
            debug!(name = %descriptor.name, "discovered device does not match name filter");
            return;
        }
        if !self.config.device.auto_connect {
            info!(device = %descriptor.id, name = %descriptor.name, "device found (auto-connect disabled)");
            return;
        }

        info!(device = %descriptor.id, name = %descriptor.name, "connecting");
        self.discovery.stop();

        let session = Uuid::new_v4();
        let mut device = self.connector.open(descriptor, session);
        device.connect();
        self.device = Some(device);
        self.session = Some(session);
        self.phase = BridgePhase::Connecting;
    }

    fn on_device_state(
        &mut self,
        session: SessionId,
        state: ConnectionState,
        reason: Option<String>,
    ) {
        if !self.is_current(session) {
            debug!(%session, %state, "state change from superseded session; ignored");
            return;
        }
        if let Some(reason) = &reason {
            warn!(%state, %reason, "device connection error");
        }

        match state {
            ConnectionState::Connected => {
                if self.phase == BridgePhase::Connecting {
                    info!("device connected; starting socket server");
                    self.phase = BridgePhase::Connected {
                        server_running: false,
                    };
                    self.server.start();
                } else {
                    debug!(phase = ?self.phase, "redundant connected notification; ignored");
                }
            }

            ConnectionState::Disconnected | ConnectionState::Invalidated => match self.phase {
                BridgePhase::Connecting => {
                    info!("connection attempt failed; resuming discovery");
                    self.drop_session();
                    self.enter_discovering();
                }
                BridgePhase::Connected { .. } => {
                    info!(%state, "device lost; stopping socket server");
                    self.phase = BridgePhase::Disconnecting;
                    self.server.stop();
                    self.registry.clear();
                    self.drop_session();
                    self.enter_discovering();
                }
                _ => {}
            },

            // Progress notifications only.
            ConnectionState::Connecting
            | ConnectionState::Disconnecting
            | ConnectionState::Discovering => {
                debug!(%state, "device state");
            }
        }
    }

    fn on_gesture(&mut self, session: SessionId, event: GestureEvent) {
        if !self.is_current(session) {
            debug!(%session, "gesture from superseded session; ignored");
            return;
        }
        // Kinds without a wire representation translate to no message; that
        // is normal operation, not an error.
        if let Some(message) = encode_gesture(&event) {
            self.registry.broadcast(&message);
        }
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn is_current(&self, session: SessionId) -> bool {
        self.session == Some(session)
    }

    fn name_matches(&self, name: &str) -> bool {
        match &self.config.device.name_prefix {
            Some(prefix) => name.starts_with(prefix.as_str()),
            None => true,
        }
    }

    fn enter_discovering(&mut self) {
        self.phase = BridgePhase::Discovering;
        info!("discovering devices");
        if let Err(e) = self.discovery.start() {
            warn!("discovery start failed: {e}");
        }
    }

    /// Forgets the current device session and its snapshot.
    fn drop_session(&mut self) {
        self.device = None;
        self.session = None;
        self.snapshot.clear();
    }

    /// Full teardown on an external stop request.
    fn teardown(&mut self) {
        self.phase = BridgePhase::Disconnecting;
        self.discovery.stop();
        if let Some(device) = self.device.as_mut() {
            device.disconnect();
        }
        self.server.stop();
        self.registry.clear();
        self.drop_session();
        self.phase = BridgePhase::Idle;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
