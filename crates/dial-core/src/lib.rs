//! # dial-core
//!
//! Shared library for the dial relay containing the gesture model, the
//! client-facing text wire protocol, the LED matrix display codec, and the
//! dial's BLE GATT profile constants.
//!
//! This crate is used by the relay service and by any transport adapter that
//! speaks to the physical device.  It has zero dependencies on OS APIs,
//! async runtimes, or network sockets — every operation in here is a pure
//! function over in-memory data, which keeps the protocol rules trivially
//! unit-testable.
//!
//! # Module map
//!
//! - **`gesture`** – The input events the dial produces: button, rotation,
//!   swipe, touch, and fly gestures.
//!
//! - **`device`** – Device identity, the connection-state enum, and the
//!   last-known firmware/battery snapshot that is replayed to late-joining
//!   clients.
//!
//! - **`protocol`** – The outbound wire codec: one gesture or status value in,
//!   one short text token out (`B,1`, `R,-3`, `S,L`, `V1.2.3`, `%87`, …).
//!
//! - **`matrix`** – The inbound direction: client text is carried verbatim as
//!   a [`MatrixCommand`] and rendered into the 9×9 [`LedFrame`] that the
//!   device's LED characteristic accepts.
//!
//! - **`ble`** – GATT service and characteristic UUIDs of the dial profile.

pub mod ble;
pub mod device;
pub mod gesture;
pub mod matrix;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `dial_core::GestureEvent` instead of `dial_core::gesture::GestureEvent`.
pub use device::{
    BatteryLevel, ConnectionState, DeviceDescriptor, DeviceId, DeviceSnapshot, FirmwareVersion,
};
pub use gesture::{GestureEvent, GestureKind};
pub use matrix::{LedFrame, MatrixCommand};
pub use protocol::wire::{encode_gesture, FlyDirection, SwipeDirection, TouchEdge, WireMessage};
