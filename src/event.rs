//! Input events fed to a session by whatever GUI or replay layer drives it.
//!
//! Coordinates are in image pixel space; the adapter is responsible for
//! undoing any zoom or pan before pushing events.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A pointer button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    Left,
    Middle,
    #[default]
    Right,
}

impl PointerButton {
    /// Conventional 1-based button number (1 = left, 2 = middle, 3 = right).
    pub fn number(self) -> u8 {
        match self {
            PointerButton::Left => 1,
            PointerButton::Middle => 2,
            PointerButton::Right => 3,
        }
    }
}

impl FromStr for PointerButton {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "1" => Ok(PointerButton::Left),
            "middle" | "2" => Ok(PointerButton::Middle),
            "right" | "3" => Ok(PointerButton::Right),
            other => Err(format!(
                "unknown pointer button '{}' (expected left, middle, right or 1-3)",
                other
            )),
        }
    }
}

/// A key identifier such as `"z"`, `"escape"` or `"ctrl+z"`.
///
/// Compared case-insensitively; single characters keep their case so that
/// `"Z"` (shifted) and `"z"` stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Key(String);

impl Key {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let name = if name.chars().count() == 1 {
            name
        } else {
            name.to_ascii_lowercase()
        };
        Self(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.0
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One discrete input event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// A pointer button was pressed at (x, y)
    PointerDown { button: PointerButton, x: f32, y: f32 },
    /// The pointer moved to (x, y)
    PointerMove { x: f32, y: f32 },
    /// A pointer button was released
    PointerUp { button: PointerButton },
    /// A key was pressed
    KeyPress { key: Key },
    /// The window was closed; the session exports and ends
    Close,
}
