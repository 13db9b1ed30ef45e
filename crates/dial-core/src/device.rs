//! Device identity, connection state, and the late-joiner snapshot.
//!
//! The relay tracks exactly one device at a time.  Two pieces of device
//! status — firmware revision and battery level — are remembered so that a
//! client which connects *after* the device reported them still receives
//! them ("snapshot replay").  Both are modelled as explicit
//! `Unknown`/`Known` enums rather than `Option` fields so the replay
//! precondition ("only send what is known") is visible in the type.

use std::fmt;

use crate::protocol::wire::WireMessage;

/// Opaque identifier for a physical device.
///
/// On most platforms this is the BLE MAC address; on macOS it is the
/// platform-assigned peripheral UUID.  The relay only ever compares it for
/// equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A device surfaced by discovery: identity plus advertised name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub id: DeviceId,
    pub name: String,
}

impl DeviceDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: DeviceId::new(id),
            name: name.into(),
        }
    }
}

/// Connection state of the device as reported by the transport.
///
/// `Invalidated` means the transport has lost the underlying peripheral
/// handle entirely (the device left radio range, or the OS dropped it);
/// unlike `Disconnected` the old descriptor cannot be reused and discovery
/// must produce a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Discovering,
    Connecting,
    Connected,
    Disconnecting,
    Invalidated,
}

impl ConnectionState {
    /// Returns `true` for the two states that mean the session is over and
    /// the relay must fall back to discovery.
    pub fn is_gone(self) -> bool {
        matches!(self, Self::Disconnected | Self::Invalidated)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Disconnected => "disconnected",
            Self::Discovering => "discovering",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnecting => "disconnecting",
            Self::Invalidated => "invalidated",
        };
        f.write_str(label)
    }
}

/// Firmware revision as last read from the device, if ever.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FirmwareVersion {
    #[default]
    Unknown,
    Known(String),
}

impl FirmwareVersion {
    pub fn known(&self) -> Option<&str> {
        match self {
            Self::Unknown => None,
            Self::Known(v) => Some(v),
        }
    }
}

/// Battery charge level as last notified by the device, if ever.
///
/// The constructor clamps to 0–100; transports occasionally report raw
/// values above 100 while the device charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatteryLevel {
    #[default]
    Unknown,
    Known(u8),
}

impl BatteryLevel {
    pub fn from_raw(level: u8) -> Self {
        Self::Known(level.min(100))
    }

    pub fn known(&self) -> Option<u8> {
        match self {
            Self::Unknown => None,
            Self::Known(v) => Some(*v),
        }
    }
}

/// Last-known firmware and battery for the *current* device session.
///
/// Cleared whenever the session ends or is superseded; the next session
/// starts from all-unknown again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSnapshot {
    pub firmware: FirmwareVersion,
    pub battery: BatteryLevel,
}

impl DeviceSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a firmware revision read.
    pub fn record_firmware(&mut self, version: impl Into<String>) {
        self.firmware = FirmwareVersion::Known(version.into());
    }

    /// Records a battery-level notification (clamped to 0–100).
    pub fn record_battery(&mut self, level: u8) {
        self.battery = BatteryLevel::from_raw(level);
    }

    /// Forgets everything.  Called on session teardown.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// The messages a late-joining client must receive: firmware first, then
    /// battery, each omitted while unknown.
    pub fn replay(&self) -> Vec<WireMessage> {
        let mut messages = Vec::with_capacity(2);
        if let FirmwareVersion::Known(version) = &self.firmware {
            messages.push(WireMessage::Firmware(version.clone()));
        }
        if let BatteryLevel::Known(level) = self.battery {
            messages.push(WireMessage::Battery(level));
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_is_gone() {
        assert!(ConnectionState::Disconnected.is_gone());
        assert!(ConnectionState::Invalidated.is_gone());
        assert!(!ConnectionState::Connected.is_gone());
        assert!(!ConnectionState::Connecting.is_gone());
    }

    #[test]
    fn test_battery_from_raw_clamps_to_100() {
        assert_eq!(BatteryLevel::from_raw(87).known(), Some(87));
        assert_eq!(BatteryLevel::from_raw(255).known(), Some(100));
    }

    #[test]
    fn test_snapshot_starts_all_unknown() {
        let snapshot = DeviceSnapshot::new();
        assert_eq!(snapshot.firmware.known(), None);
        assert_eq!(snapshot.battery.known(), None);
        assert!(snapshot.replay().is_empty());
    }

    #[test]
    fn test_snapshot_replay_orders_firmware_before_battery() {
        let mut snapshot = DeviceSnapshot::new();
        snapshot.record_battery(87);
        snapshot.record_firmware("1.2.3");

        // Replay order is fixed regardless of the order values arrived in.
        let replay = snapshot.replay();
        assert_eq!(
            replay,
            vec![
                WireMessage::Firmware("1.2.3".to_string()),
                WireMessage::Battery(87),
            ]
        );
    }

    #[test]
    fn test_snapshot_replay_omits_unknown_fields() {
        let mut snapshot = DeviceSnapshot::new();
        snapshot.record_firmware("0.9");
        assert_eq!(
            snapshot.replay(),
            vec![WireMessage::Firmware("0.9".to_string())]
        );

        snapshot.clear();
        snapshot.record_battery(12);
        assert_eq!(snapshot.replay(), vec![WireMessage::Battery(12)]);
    }

    #[test]
    fn test_snapshot_clear_forgets_both_values() {
        let mut snapshot = DeviceSnapshot::new();
        snapshot.record_firmware("1.0");
        snapshot.record_battery(50);
        snapshot.clear();
        assert_eq!(snapshot, DeviceSnapshot::default());
    }
}
