//! Gesture events produced by the dial.
//!
//! The device reports discrete gestures (button edges, swipes, touches, fly
//! motions) and one continuous gesture (ring rotation, which carries a signed
//! step count).  Transport adapters decode characteristic notifications into
//! [`GestureEvent`] values; everything downstream of the adapter works on
//! this representation only.

/// Every gesture kind the dial can report.
///
/// Not every kind has a client-facing wire representation: the long-touch
/// kinds are delivered by the hardware but are deliberately not relayed, so
/// [`encode_gesture`](crate::protocol::wire::encode_gesture) returns no
/// message for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKind {
    /// The top button was pressed down.
    ButtonPress,
    /// The top button was released.
    ButtonRelease,
    /// The outer ring rotated; the event value carries the signed step delta
    /// (positive = clockwise).
    Rotate,
    SwipeLeft,
    SwipeRight,
    SwipeUp,
    SwipeDown,
    TouchLeft,
    TouchRight,
    TouchTop,
    TouchBottom,
    /// Long-press variants of the touch gestures.  Reported by the device,
    /// not relayed to clients.
    LongTouchLeft,
    LongTouchRight,
    LongTouchTop,
    LongTouchBottom,
    FlyLeft,
    FlyRight,
    /// Hand moving away from the fly sensor.
    FlyBackwards,
    /// Hand moving toward the fly sensor.
    FlyTowards,
}

/// A single gesture report from the device.
///
/// `value` is only populated for gesture kinds that carry a magnitude —
/// in the current profile that is [`GestureKind::Rotate`].  A rotate event
/// without a value is legal and encodes as a zero delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureEvent {
    pub kind: GestureKind,
    pub value: Option<i32>,
}

impl GestureEvent {
    /// Creates a value-less gesture event.
    pub fn new(kind: GestureKind) -> Self {
        Self { kind, value: None }
    }

    /// Creates a gesture event carrying a magnitude (rotation steps).
    pub fn with_value(kind: GestureKind, value: i32) -> Self {
        Self {
            kind,
            value: Some(value),
        }
    }
}
