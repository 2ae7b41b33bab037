//! Input abstraction layer.
//!
//! Normalizes pointer, wheel, native pinch-gesture and keyboard events into a
//! unified `InputEvent` enum consumed by the engine. Positions are in screen
//! pixels relative to the canvas container; timestamps are milliseconds from
//! any monotonic origin (e.g. `Event.timeStamp`).

use dc_core::model::{AnchorRef, Point};

/// Keyboard modifier state at the time of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const ALT: Modifiers = Modifiers {
        alt: true,
        ..Modifiers::NONE
    };

    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        ..Modifiers::NONE
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ..Modifiers::NONE
    };

    /// Platform command key: ⌘ on macOS, Ctrl elsewhere.
    pub fn cmd(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerButton {
    #[default]
    Primary,
    Middle,
    Secondary,
}

/// Pointer payload shared by down/move/up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub pointer_id: u32,
    /// Screen-space position relative to the canvas container.
    pub position: Point,
    pub button: PointerButton,
    pub modifiers: Modifiers,
    pub timestamp: f64,
    /// Connection dot under the pointer, when the host can tell from its
    /// element tree. Used as a fallback target for relationship drags.
    pub over_anchor: Option<AnchorRef>,
}

impl PointerInput {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            pointer_id: 1,
            position: Point::new(x, y),
            button: PointerButton::Primary,
            modifiers: Modifiers::NONE,
            timestamp: 0.0,
            over_anchor: None,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_pointer_id(mut self, pointer_id: u32) -> Self {
        self.pointer_id = pointer_id;
        self
    }

    pub fn over_anchor(mut self, anchor: AnchorRef) -> Self {
        self.over_anchor = Some(anchor);
        self
    }
}

/// Native wheel event data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelInput {
    pub delta_x: f64,
    pub delta_y: f64,
    /// Trackpad pinch is reported as Ctrl+wheel.
    pub ctrl_key: bool,
    pub position: Point,
    pub timestamp: f64,
}

/// Keyboard payload.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyInput {
    /// `KeyboardEvent.key` value (e.g. `"a"`, `"Delete"`, `" "`).
    pub key: String,
    pub modifiers: Modifiers,
    /// Focus is inside a text input or textarea; shortcuts are suppressed.
    pub in_text_field: bool,
    pub timestamp: f64,
}

impl KeyInput {
    pub fn new(key: &str, modifiers: Modifiers) -> Self {
        Self {
            key: key.to_string(),
            modifiers,
            in_text_field: false,
            timestamp: 0.0,
        }
    }
}

/// A normalized input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown(PointerInput),
    PointerMove(PointerInput),
    PointerUp(PointerInput),
    /// Pointer capture lost (pointer left the canvas, OS cancel, ...).
    /// Ends the active gesture as if released.
    LostPointerCapture { pointer_id: u32, timestamp: f64 },
    Wheel(WheelInput),
    /// Safari-style native pinch gestures.
    GestureStart { scale: f64, position: Point, timestamp: f64 },
    GestureChange { scale: f64, position: Point, timestamp: f64 },
    GestureEnd { timestamp: f64 },
    KeyDown(KeyInput),
    KeyUp(KeyInput),
}

impl InputEvent {
    /// Extract position if this is a pointer event.
    pub fn position(&self) -> Option<Point> {
        match self {
            Self::PointerDown(p) | Self::PointerMove(p) | Self::PointerUp(p) => Some(p.position),
            Self::Wheel(w) => Some(w.position),
            Self::GestureStart { position, .. } | Self::GestureChange { position, .. } => {
                Some(*position)
            }
            _ => None,
        }
    }

    pub fn timestamp(&self) -> f64 {
        match self {
            Self::PointerDown(p) | Self::PointerMove(p) | Self::PointerUp(p) => p.timestamp,
            Self::LostPointerCapture { timestamp, .. }
            | Self::GestureStart { timestamp, .. }
            | Self::GestureChange { timestamp, .. }
            | Self::GestureEnd { timestamp } => *timestamp,
            Self::Wheel(w) => w.timestamp,
            Self::KeyDown(k) | Self::KeyUp(k) => k.timestamp,
        }
    }
}
