//! Infrastructure layer for dial-bridge.
//!
//! All I/O lives here:
//!
//! - `socket` — the client-facing WebSocket server (tokio-tungstenite) plus
//!   the [`socket::SocketServer`] seam and its recording mock.
//! - `device` — the device transport seams ([`device::DeviceDiscovery`],
//!   [`device::DeviceConnector`], [`device::DeviceControl`]) and the
//!   simulated dial that implements them.
//!
//! Nothing in here holds relay state: every component reports what happened
//! as [`RelayEvent`](crate::domain::events::RelayEvent)s and lets the bridge
//! loop decide.

pub mod device;
pub mod socket;
