//! BLE GATT profile of the dial.
//!
//! UUIDs and payload facts a transport adapter needs to talk to the physical
//! device.  The relay core itself never touches these — they are published
//! here so adapters and the core agree on a single source of truth.

/// Vendor sensor service exposing the gesture characteristics.
pub const SENSOR_SERVICE_UUID: &str = "f29b1525-cb19-40f3-be5c-7241ecb82fd1";

/// Button characteristic (notify): 1 byte, 1 = pressed, 0 = released.
pub const BUTTON_CHARACTERISTIC_UUID: &str = "f29b1529-cb19-40f3-be5c-7241ecb82fd1";

/// Rotation characteristic (notify): little-endian i16 step delta.
pub const ROTATION_CHARACTERISTIC_UUID: &str = "f29b1528-cb19-40f3-be5c-7241ecb82fd1";

/// Swipe/touch characteristic (notify): 1 byte direction code.
pub const SWIPE_CHARACTERISTIC_UUID: &str = "f29b1527-cb19-40f3-be5c-7241ecb82fd1";

/// Fly-gesture characteristic (notify): 2 bytes, direction code + speed.
pub const FLY_CHARACTERISTIC_UUID: &str = "f29b1526-cb19-40f3-be5c-7241ecb82fd1";

/// Vendor LED service carrying the display matrix characteristic.
pub const LED_SERVICE_UUID: &str = "f29b1523-cb19-40f3-be5c-7241ecb82fd2";

/// LED matrix characteristic (write): 13-byte frame, see
/// [`crate::matrix::LedFrame::to_gatt_bytes`].
pub const LED_MATRIX_CHARACTERISTIC_UUID: &str = "f29b1524-cb19-40f3-be5c-7241ecb82fd2";

/// Standard battery service (0x180F).
pub const BATTERY_SERVICE_UUID: &str = "0000180f-0000-1000-8000-00805f9b34fb";

/// Standard battery level characteristic (0x2A19, read + notify): 1 byte 0–100.
pub const BATTERY_LEVEL_CHARACTERISTIC_UUID: &str = "00002a19-0000-1000-8000-00805f9b34fb";

/// Standard device information service (0x180A).
pub const DEVICE_INFO_SERVICE_UUID: &str = "0000180a-0000-1000-8000-00805f9b34fb";

/// Firmware revision string characteristic (0x2A26, read): UTF-8.
pub const FIRMWARE_REVISION_CHARACTERISTIC_UUID: &str = "00002a26-0000-1000-8000-00805f9b34fb";
