//! Domain layer for dial-bridge.
//!
//! The vocabulary the rest of the service speaks: the tagged relay event
//! that every asynchronous source feeds into the bridge loop, the per-socket
//! client handle, and the runtime configuration.

pub mod config;
pub mod events;

pub use config::{ConfigError, DeviceConfig, RelayConfig, ServerConfig};
pub use events::{ClientHandle, RelayEvent, SessionId, SocketId};
