//! Stable button ids (GLFW numbering) and their winit translations.

use winit::event::MouseButton;
use winit::keyboard::KeyCode;

pub const SPACE: i32 = 32;
pub const APOSTROPHE: i32 = 39;
pub const COMMA: i32 = 44;
pub const MINUS: i32 = 45;
pub const PERIOD: i32 = 46;
pub const SLASH: i32 = 47;
pub const DIGIT_0: i32 = 48;
pub const SEMICOLON: i32 = 59;
pub const EQUAL: i32 = 61;
pub const A: i32 = 65;
pub const D: i32 = 68;
pub const E: i32 = 69;
pub const Q: i32 = 81;
pub const S: i32 = 83;
pub const W: i32 = 87;
pub const ESCAPE: i32 = 256;
pub const ENTER: i32 = 257;
pub const TAB: i32 = 258;
pub const BACKSPACE: i32 = 259;
pub const RIGHT: i32 = 262;
pub const LEFT: i32 = 263;
pub const DOWN: i32 = 264;
pub const UP: i32 = 265;
pub const F1: i32 = 290;
pub const LEFT_SHIFT: i32 = 340;
pub const LEFT_CONTROL: i32 = 341;
pub const LEFT_ALT: i32 = 342;
pub const RIGHT_SHIFT: i32 = 344;
pub const RIGHT_CONTROL: i32 = 345;
pub const RIGHT_ALT: i32 = 346;

pub const MOUSE_LEFT: i32 = 0;
pub const MOUSE_RIGHT: i32 = 1;
pub const MOUSE_MIDDLE: i32 = 2;

const LETTERS: [KeyCode; 26] = [
    KeyCode::KeyA, KeyCode::KeyB, KeyCode::KeyC, KeyCode::KeyD, KeyCode::KeyE, KeyCode::KeyF,
    KeyCode::KeyG, KeyCode::KeyH, KeyCode::KeyI, KeyCode::KeyJ, KeyCode::KeyK, KeyCode::KeyL,
    KeyCode::KeyM, KeyCode::KeyN, KeyCode::KeyO, KeyCode::KeyP, KeyCode::KeyQ, KeyCode::KeyR,
    KeyCode::KeyS, KeyCode::KeyT, KeyCode::KeyU, KeyCode::KeyV, KeyCode::KeyW, KeyCode::KeyX,
    KeyCode::KeyY, KeyCode::KeyZ,
];

const DIGITS: [KeyCode; 10] = [
    KeyCode::Digit0, KeyCode::Digit1, KeyCode::Digit2, KeyCode::Digit3, KeyCode::Digit4,
    KeyCode::Digit5, KeyCode::Digit6, KeyCode::Digit7, KeyCode::Digit8, KeyCode::Digit9,
];

const FUNCTION_KEYS: [KeyCode; 12] = [
    KeyCode::F1, KeyCode::F2, KeyCode::F3, KeyCode::F4, KeyCode::F5, KeyCode::F6,
    KeyCode::F7, KeyCode::F8, KeyCode::F9, KeyCode::F10, KeyCode::F11, KeyCode::F12,
];

/// GLFW id of a physical key, if the engine knows it.
pub fn from_key_code(code: KeyCode) -> Option<i32> {
    if let Some(i) = LETTERS.iter().position(|&k| k == code) {
        return Some(A + i as i32);
    }
    if let Some(i) = DIGITS.iter().position(|&k| k == code) {
        return Some(DIGIT_0 + i as i32);
    }
    if let Some(i) = FUNCTION_KEYS.iter().position(|&k| k == code) {
        return Some(F1 + i as i32);
    }
    let id = match code {
        KeyCode::Space => SPACE,
        KeyCode::Quote => APOSTROPHE,
        KeyCode::Comma => COMMA,
        KeyCode::Minus => MINUS,
        KeyCode::Period => PERIOD,
        KeyCode::Slash => SLASH,
        KeyCode::Semicolon => SEMICOLON,
        KeyCode::Equal => EQUAL,
        KeyCode::Escape => ESCAPE,
        KeyCode::Enter => ENTER,
        KeyCode::Tab => TAB,
        KeyCode::Backspace => BACKSPACE,
        KeyCode::ArrowRight => RIGHT,
        KeyCode::ArrowLeft => LEFT,
        KeyCode::ArrowDown => DOWN,
        KeyCode::ArrowUp => UP,
        KeyCode::ShiftLeft => LEFT_SHIFT,
        KeyCode::ControlLeft => LEFT_CONTROL,
        KeyCode::AltLeft => LEFT_ALT,
        KeyCode::ShiftRight => RIGHT_SHIFT,
        KeyCode::ControlRight => RIGHT_CONTROL,
        KeyCode::AltRight => RIGHT_ALT,
        _ => return None,
    };
    Some(id)
}

pub fn from_mouse_button(button: MouseButton) -> Option<i32> {
    match button {
        MouseButton::Left => Some(MOUSE_LEFT),
        MouseButton::Right => Some(MOUSE_RIGHT),
        MouseButton::Middle => Some(MOUSE_MIDDLE),
        MouseButton::Back => Some(3),
        MouseButton::Forward => Some(4),
        MouseButton::Other(n) if (5..8).contains(&n) => Some(n as i32),
        MouseButton::Other(_) => None,
    }
}
