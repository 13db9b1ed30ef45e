//! Device transport seams.
//!
//! The physical dial is reached over BLE, but nothing in the relay core may
//! depend on a Bluetooth stack: the bridge sees three small traits, and the
//! transport reports everything it learns as relay events.  The traits are
//! synchronous and non-blocking — implementations spawn their own tasks and
//! signal completion through the event channel, never through a blocking
//! return.
//!
//! This crate ships one implementation, the deterministic
//! [`simulated`] dial used by `--simulate` and by the tests.  A production
//! BLE adapter implements the same three traits against the GATT profile in
//! [`dial_core::ble`].

use thiserror::Error;

use dial_core::{DeviceDescriptor, MatrixCommand};

use crate::domain::events::SessionId;

pub mod simulated;

/// Error type for device transport operations.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The local Bluetooth adapter is missing or powered off.
    #[error("bluetooth adapter unavailable: {0}")]
    AdapterUnavailable(String),
    /// The transport failed in a way the relay can only log.
    #[error("device transport error: {0}")]
    Transport(String),
}

/// Scans for candidate devices.
///
/// Discovered devices surface as `DeviceFound` events.  `start` on an
/// already-scanning watcher and `stop` on an idle one are no-ops; a stopped
/// watcher can be restarted and will surface devices again.
pub trait DeviceDiscovery: Send {
    fn start(&mut self) -> Result<(), DeviceError>;
    fn stop(&mut self);
    fn is_scanning(&self) -> bool;
}

/// One live connection attempt to one device.
///
/// Every event a control emits is tagged with its [`SessionId`]; the bridge
/// uses the tag to discard callbacks from superseded sessions.
pub trait DeviceControl: Send {
    fn session(&self) -> SessionId;
    fn descriptor(&self) -> &DeviceDescriptor;
    /// Begins the asynchronous connection.  Success or failure arrives as a
    /// `DeviceState` event; connect errors are never returned here.
    fn connect(&mut self);
    /// Requests teardown.  Idempotent; safe in any state, including
    /// mid-connect.
    fn disconnect(&mut self);
    /// Fire-and-forget display write.  The transport may drop it silently;
    /// parse problems in the command text are resolved by the total matrix
    /// parser, never by failing the relay.
    fn send_matrix(&mut self, command: MatrixCommand);
}

/// Turns a discovered descriptor into a live [`DeviceControl`].
pub trait DeviceConnector: Send {
    fn open(&mut self, descriptor: DeviceDescriptor, session: SessionId) -> Box<dyn DeviceControl>;
}
