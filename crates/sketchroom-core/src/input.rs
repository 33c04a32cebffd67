//! Input events delivered to the drawing engine by the host surface.
//!
//! Positions are in screen pixels relative to the canvas surface.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const CTRL: Self = Self {
        shift: false,
        ctrl: true,
        alt: false,
        meta: false,
    };
}

/// Pointer event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    Wheel {
        position: Point,
        delta: Vec2,
        modifiers: Modifiers,
    },
}

impl PointerEvent {
    pub fn position(&self) -> Point {
        match self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Up { position, .. }
            | PointerEvent::Move { position }
            | PointerEvent::Wheel { position, .. } => *position,
        }
    }
}

/// Keyboard event. `code` names the physical key (`"Space"`, `"KeyZ"`),
/// `key` the produced character (`"z"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyEvent {
    Pressed {
        code: String,
        key: String,
        modifiers: Modifiers,
    },
    Released {
        code: String,
        key: String,
        modifiers: Modifiers,
    },
}

/// Engine commands bound to keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Undo,
    Redo,
    PanHoldStart,
    PanHoldEnd,
}

impl KeyEvent {
    pub fn pressed(code: &str, key: &str, modifiers: Modifiers) -> Self {
        KeyEvent::Pressed {
            code: code.to_string(),
            key: key.to_string(),
            modifiers,
        }
    }

    pub fn released(code: &str, key: &str, modifiers: Modifiers) -> Self {
        KeyEvent::Released {
            code: code.to_string(),
            key: key.to_string(),
            modifiers,
        }
    }

    /// Map the event to an engine shortcut, if it is bound to one.
    pub fn shortcut(&self) -> Option<Shortcut> {
        match self {
            KeyEvent::Pressed { code, .. } if code == "Space" => Some(Shortcut::PanHoldStart),
            KeyEvent::Pressed { key, modifiers, .. } if modifiers.ctrl && key == "z" => {
                Some(Shortcut::Undo)
            }
            KeyEvent::Pressed { key, modifiers, .. } if modifiers.ctrl && key == "y" => {
                Some(Shortcut::Redo)
            }
            KeyEvent::Released { code, .. } if code == "Space" => Some(Shortcut::PanHoldEnd),
            _ => None,
        }
    }
}
