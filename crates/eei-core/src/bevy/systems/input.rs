//! Input translation systems.
//!
//! Window input is read from Bevy's `ButtonInput` resources and the primary
//! window, and queued on `FrameInput` as backend-independent events.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::bevy::resources::{FrameInput, SceneDirectorRes};
use crate::input::{InputEvent, Key, Modifiers, PointerButton};

const MODIFIER_KEYS: [KeyCode; 4] = [
    KeyCode::ControlLeft,
    KeyCode::ControlRight,
    KeyCode::ShiftLeft,
    KeyCode::ShiftRight,
];

/// Map a Bevy key code onto the keys scenes understand.
pub fn map_key_code(code: KeyCode) -> Key {
    match code {
        KeyCode::Space => Key::Space,
        KeyCode::Delete => Key::Delete,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Tab => Key::Tab,
        KeyCode::Escape => Key::Escape,
        KeyCode::Enter | KeyCode::NumpadEnter => Key::Enter,
        KeyCode::F1 => Key::F1,
        KeyCode::F2 => Key::F2,
        KeyCode::KeyS => Key::S,
        KeyCode::KeyP => Key::P,
        KeyCode::Digit0 => Key::Digit(0),
        KeyCode::Digit1 => Key::Digit(1),
        KeyCode::Digit2 => Key::Digit(2),
        KeyCode::Digit3 => Key::Digit(3),
        KeyCode::Digit4 => Key::Digit(4),
        KeyCode::Digit5 => Key::Digit(5),
        KeyCode::Digit6 => Key::Digit(6),
        KeyCode::Digit7 => Key::Digit(7),
        KeyCode::Digit8 => Key::Digit(8),
        KeyCode::Digit9 => Key::Digit(9),
        _ => Key::Other,
    }
}

pub fn map_mouse_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Left),
        MouseButton::Right => Some(PointerButton::Right),
        MouseButton::Middle => Some(PointerButton::Middle),
        _ => None,
    }
}

fn current_modifiers(keys: &ButtonInput<KeyCode>) -> Modifiers {
    Modifiers {
        ctrl: keys.any_pressed([KeyCode::ControlLeft, KeyCode::ControlRight]),
        shift: keys.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]),
    }
}

/// System to queue key presses and releases. Modifier keys only show up
/// through `Modifiers`.
pub fn collect_keyboard_input(keys: Res<ButtonInput<KeyCode>>, mut frame: ResMut<FrameInput>) {
    let modifiers = current_modifiers(&keys);

    for code in keys.get_just_pressed() {
        if MODIFIER_KEYS.contains(code) {
            continue;
        }
        frame.push(InputEvent::KeyDown {
            key: map_key_code(*code),
            modifiers,
        });
    }

    for code in keys.get_just_released() {
        if MODIFIER_KEYS.contains(code) {
            continue;
        }
        frame.push(InputEvent::KeyUp {
            key: map_key_code(*code),
            modifiers,
        });
    }
}

/// System to queue mouse button presses and releases at the last cursor
/// position.
pub fn collect_mouse_input(buttons: Res<ButtonInput<MouseButton>>, mut frame: ResMut<FrameInput>) {
    let position = frame.cursor;

    let pressed: Vec<_> = buttons
        .get_just_pressed()
        .filter_map(|b| map_mouse_button(*b))
        .collect();
    for button in pressed {
        frame.push(InputEvent::PointerDown { position, button });
    }

    let released: Vec<_> = buttons
        .get_just_released()
        .filter_map(|b| map_mouse_button(*b))
        .collect();
    for button in released {
        frame.push(InputEvent::PointerUp { position, button });
    }
}

/// System to follow the cursor over the primary window.
///
/// Window cursor coordinates already match canvas space (origin top-left,
/// y down), so no camera projection is needed.
pub fn track_cursor(windows: Query<&Window, With<PrimaryWindow>>, mut frame: ResMut<FrameInput>) {
    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };

    if cursor != frame.cursor {
        frame.cursor = cursor;
        frame.push(InputEvent::PointerMoved { position: cursor });
    }
}

/// System to report window size changes to the director.
pub fn watch_window_size(
    windows: Query<&Window, With<PrimaryWindow>>,
    director: Res<SceneDirectorRes>,
    mut frame: ResMut<FrameInput>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let size = window.size();
    if size != director.0.context().viewport {
        frame.push(InputEvent::Resized { size });
    }
}
