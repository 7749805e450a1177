//! Navigation key codes produced by the gamepad

use serde::{Deserialize, Serialize};

pub const ASCII_ENTER: u8 = b'\r';
pub const ASCII_ESCAPE: u8 = 0x1B;
pub const ASCII_EDIT: u8 = b'e';
pub const ASCII_COMMAND: u8 = b'c';

/// Discrete key handed to the text-mode UI.
///
/// `NoKey` means "nothing available" and is never queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum KeyCode {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Escape,
    /// Edit the highlighted menu entry.
    EditChar,
    /// Open the command line.
    CommandChar,
    PageUp,
    PageDown,
    #[default]
    NoKey,
}

impl KeyCode {
    pub const fn is_key(self) -> bool {
        !matches!(self, KeyCode::NoKey)
    }

    /// ASCII byte the terminal layer sees for this key, if it has one.
    pub const fn ascii(self) -> Option<u8> {
        match self {
            KeyCode::Enter => Some(ASCII_ENTER),
            KeyCode::Escape => Some(ASCII_ESCAPE),
            KeyCode::EditChar => Some(ASCII_EDIT),
            KeyCode::CommandChar => Some(ASCII_COMMAND),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            KeyCode::Up => "up",
            KeyCode::Down => "down",
            KeyCode::Left => "left",
            KeyCode::Right => "right",
            KeyCode::Enter => "enter",
            KeyCode::Escape => "escape",
            KeyCode::EditChar => "edit",
            KeyCode::CommandChar => "command",
            KeyCode::PageUp => "page-up",
            KeyCode::PageDown => "page-down",
            KeyCode::NoKey => "none",
        }
    }
}

impl core::fmt::Display for KeyCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
