//! dial-bridge library crate.
//!
//! This crate implements a headless relay between one Bluetooth-LE smart
//! dial and any number of WebSocket clients: device gestures and status fan
//! out to every client as short text frames, and client text flows back to
//! the device as LED-matrix display commands.
//!
//! # Architecture
//!
//! ```text
//! BLE transport adapter (or simulator)          WebSocket clients
//!         │  device events                            ▲  text frames
//!         ▼                                           │
//!   ┌──────────────── relay event channel ────────────┴───┐
//!   │                 RelayBridge (single consumer)       │
//!   │   domain/        RelayEvent, ClientHandle, config   │
//!   │   application/   ClientRegistry, RelayBridge        │
//!   │   infrastructure/ ws server, device trait seams     │
//!   └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Layer rules
//!
//! - `domain` holds the event vocabulary and configuration.  It depends on
//!   `dial-core` plus tokio's channel primitives (a [`ClientHandle`]
//!   *is* a per-socket send queue) — nothing else.
//! - `application` holds the logic with invariants: the client registry and
//!   the bridge state machine.  No sockets, no BLE.
//! - `infrastructure` does I/O: the tokio-tungstenite WebSocket server and
//!   the device transport seams with their simulated implementation.
//!
//! # Concurrency model
//!
//! Device callbacks and socket I/O both arrive asynchronously, but every
//! state transition and every registry mutation happens on one consumer
//! loop reading one `mpsc` channel of [`RelayEvent`]s.  Producers (the
//! accept loop, per-socket readers, the device adapter) only ever *send*
//! events.  This single-writer discipline is what makes the lifecycle
//! invariants (at most one device session, snapshot-before-broadcast
//! ordering, prompt removal of closed sockets) easy to uphold and test.
//!
//! [`ClientHandle`]: domain::events::ClientHandle
//! [`RelayEvent`]: domain::events::RelayEvent

/// Domain layer: relay events, client handles, configuration.
pub mod domain;

/// Application layer: client registry and the bridge state machine.
pub mod application;

/// Infrastructure layer: WebSocket server and device transport seams.
pub mod infrastructure;
