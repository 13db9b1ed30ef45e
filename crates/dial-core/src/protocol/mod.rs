//! The client-facing wire protocol.
//!
//! Everything a client ever receives is a single short text line produced by
//! [`wire::WireMessage`]; everything a client sends is free-form text carried
//! verbatim to the device as a display command (see [`crate::matrix`]).

pub mod wire;

pub use wire::{encode_gesture, WireMessage};
