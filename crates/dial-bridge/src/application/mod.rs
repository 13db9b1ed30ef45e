//! Application layer for dial-bridge.
//!
//! The logic with invariants, free of any I/O:
//!
//! - [`registry::ClientRegistry`] — the set of live client sockets with
//!   partial-failure-isolated broadcast.
//! - [`bridge::RelayBridge`] — the lifecycle state machine consuming the
//!   relay event channel.

pub mod bridge;
pub mod registry;

pub use bridge::{BridgePhase, RelayBridge};
pub use registry::ClientRegistry;
