//! Backend-independent input events.
//!
//! Scenes and payloads never see Bevy input types directly; the Bevy layer
//! translates `ButtonInput` state and cursor motion into these events once
//! per frame. Positions are in canvas space (origin top-left, y down).

use bevy::math::Vec2;

/// Keys the game reacts to. Everything else arrives as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Space,
    Delete,
    Backspace,
    Tab,
    Escape,
    Enter,
    F1,
    F2,
    S,
    P,
    /// Number row key `0..=9`.
    Digit(u8),
    Other,
}

/// Modifier keys held while a key event fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        shift: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        shift: false,
    };

    pub const SHIFT: Self = Self {
        ctrl: false,
        shift: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}

/// A single input event delivered to the active scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown { key: Key, modifiers: Modifiers },
    KeyUp { key: Key, modifiers: Modifiers },
    PointerDown { position: Vec2, button: PointerButton },
    PointerUp { position: Vec2, button: PointerButton },
    PointerMoved { position: Vec2 },
    /// The drawable area changed size (logical pixels).
    Resized { size: Vec2 },
}

impl InputEvent {
    /// Convenience constructor for a key press without modifiers.
    pub fn key_down(key: Key) -> Self {
        Self::KeyDown {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn key_up(key: Key) -> Self {
        Self::KeyUp {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn click(position: Vec2) -> Self {
        Self::PointerDown {
            position,
            button: PointerButton::Left,
        }
    }

    pub fn release(position: Vec2) -> Self {
        Self::PointerUp {
            position,
            button: PointerButton::Left,
        }
    }

    /// Returns the pointer position carried by pointer events.
    pub fn pointer_position(&self) -> Option<Vec2> {
        match self {
            Self::PointerDown { position, .. }
            | Self::PointerUp { position, .. }
            | Self::PointerMoved { position } => Some(*position),
            _ => None,
        }
    }

    /// True for a key press of `key`, regardless of modifiers.
    pub fn is_key_down(&self, key: Key) -> bool {
        matches!(self, Self::KeyDown { key: k, .. } if *k == key)
    }

    pub fn is_key_up(&self, key: Key) -> bool {
        matches!(self, Self::KeyUp { key: k, .. } if *k == key)
    }
}
