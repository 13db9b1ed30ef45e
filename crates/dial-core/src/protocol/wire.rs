//! Outbound text wire codec.
//!
//! Each device event is relayed to clients as one WebSocket text frame
//! containing a single-character tag followed by its payload:
//!
//! ```text
//! B,1   B,0        button press / release
//! R,<int>          signed rotation delta
//! S,{L,R,U,D}      swipe
//! T,{L,R,T,B}      touch
//! F,{L,R,B,T}      fly
//! V<string>        firmware version
//! %<int>           battery level 0–100
//! ```
//!
//! Encoding is a *total* function over gesture kinds: kinds without a wire
//! representation (the long-touch family) translate to "no message", never
//! to an error and never to an empty string that could be confused with a
//! valid token.  This mirrors how a relay must behave when the device
//! firmware grows new gesture kinds: unknown input is dropped, not fatal.

use std::fmt;

use crate::gesture::{GestureEvent, GestureKind};

// ── Directional payloads ──────────────────────────────────────────────────────

/// Payload letter for an `S,*` swipe message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
    Up,
    Down,
}

impl SwipeDirection {
    fn letter(self) -> char {
        match self {
            Self::Left => 'L',
            Self::Right => 'R',
            Self::Up => 'U',
            Self::Down => 'D',
        }
    }
}

/// Payload letter for a `T,*` touch message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchEdge {
    Left,
    Right,
    Top,
    Bottom,
}

impl TouchEdge {
    fn letter(self) -> char {
        match self {
            Self::Left => 'L',
            Self::Right => 'R',
            Self::Top => 'T',
            Self::Bottom => 'B',
        }
    }
}

/// Payload letter for an `F,*` fly message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlyDirection {
    Left,
    Right,
    Backwards,
    Towards,
}

impl FlyDirection {
    fn letter(self) -> char {
        match self {
            Self::Left => 'L',
            Self::Right => 'R',
            Self::Backwards => 'B',
            Self::Towards => 'T',
        }
    }
}

// ── Wire messages ─────────────────────────────────────────────────────────────

/// One outbound message, exactly as it appears on the wire via `Display`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireMessage {
    Button { pressed: bool },
    Rotate { delta: i32 },
    Swipe(SwipeDirection),
    Touch(TouchEdge),
    Fly(FlyDirection),
    Firmware(String),
    Battery(u8),
}

impl fmt::Display for WireMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Button { pressed } => write!(f, "B,{}", if *pressed { 1 } else { 0 }),
            Self::Rotate { delta } => write!(f, "R,{delta}"),
            Self::Swipe(direction) => write!(f, "S,{}", direction.letter()),
            Self::Touch(edge) => write!(f, "T,{}", edge.letter()),
            Self::Fly(direction) => write!(f, "F,{}", direction.letter()),
            Self::Firmware(version) => write!(f, "V{version}"),
            Self::Battery(level) => write!(f, "%{level}"),
        }
    }
}

// ── Gesture encoding ──────────────────────────────────────────────────────────

/// Translates a device gesture into its wire message, or `None` for kinds
/// that are not relayed.
///
/// A rotate event without a value encodes as a zero delta rather than being
/// dropped — the client still learns that the ring moved.
pub fn encode_gesture(event: &GestureEvent) -> Option<WireMessage> {
    let message = match event.kind {
        GestureKind::ButtonPress => WireMessage::Button { pressed: true },
        GestureKind::ButtonRelease => WireMessage::Button { pressed: false },
        GestureKind::Rotate => WireMessage::Rotate {
            delta: event.value.unwrap_or(0),
        },
        GestureKind::SwipeLeft => WireMessage::Swipe(SwipeDirection::Left),
        GestureKind::SwipeRight => WireMessage::Swipe(SwipeDirection::Right),
        GestureKind::SwipeUp => WireMessage::Swipe(SwipeDirection::Up),
        GestureKind::SwipeDown => WireMessage::Swipe(SwipeDirection::Down),
        GestureKind::TouchLeft => WireMessage::Touch(TouchEdge::Left),
        GestureKind::TouchRight => WireMessage::Touch(TouchEdge::Right),
        GestureKind::TouchTop => WireMessage::Touch(TouchEdge::Top),
        GestureKind::TouchBottom => WireMessage::Touch(TouchEdge::Bottom),
        GestureKind::FlyLeft => WireMessage::Fly(FlyDirection::Left),
        GestureKind::FlyRight => WireMessage::Fly(FlyDirection::Right),
        GestureKind::FlyBackwards => WireMessage::Fly(FlyDirection::Backwards),
        GestureKind::FlyTowards => WireMessage::Fly(FlyDirection::Towards),
        // Delivered by the hardware, not part of the wire protocol.
        GestureKind::LongTouchLeft
        | GestureKind::LongTouchRight
        | GestureKind::LongTouchTop
        | GestureKind::LongTouchBottom => return None,
    };
    Some(message)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
