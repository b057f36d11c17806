//! Hotkey combination definitions
//!
//! A hotkey is one non-modifier key (macOS virtual key code) plus an exact
//! set of modifier keys.

use std::fmt;
use std::str::FromStr;

/// macOS virtual key codes (`kVK_*` from `Events.h`)
pub mod codes {
    pub const TAB: u16 = 0x30;
    pub const SPACE: u16 = 0x31;
    pub const RETURN: u16 = 0x24;
    pub const ESCAPE: u16 = 0x35;

    /// ANSI letter keys, indexed by `letter - 'a'`
    pub const LETTERS: [u16; 26] = [
        0x00, 0x0B, 0x08, 0x02, 0x0E, 0x03, 0x05, 0x04, 0x22, 0x26, 0x28, 0x25, 0x2E, 0x2D,
        0x1F, 0x23, 0x0C, 0x0F, 0x01, 0x11, 0x20, 0x09, 0x0D, 0x07, 0x10, 0x06,
    ];

    /// Function keys F1..F12
    pub const FUNCTION: [u16; 12] = [
        0x7A, 0x78, 0x63, 0x76, 0x60, 0x61, 0x62, 0x64, 0x65, 0x6D, 0x67, 0x6F,
    ];
}

/// Which modifier keys are held
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub control: bool,
    pub option: bool,
    pub command: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const CONTROL: Self = Self {
        control: true,
        option: false,
        command: false,
        shift: false,
    };

    /// Build from CGEventFlags, ignoring caps lock, fn and device bits
    #[cfg(target_os = "macos")]
    pub fn from_flags(flags: core_graphics::event::CGEventFlags) -> Self {
        use core_graphics::event::CGEventFlags;

        Self {
            control: flags.contains(CGEventFlags::CGEventFlagControl),
            option: flags.contains(CGEventFlags::CGEventFlagAlternate),
            command: flags.contains(CGEventFlags::CGEventFlagCommand),
            shift: flags.contains(CGEventFlags::CGEventFlagShift),
        }
    }
}

/// A single global hotkey
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hotkey {
    pub modifiers: Modifiers,
    pub key_code: u16,
}

impl Default for Hotkey {
    /// Control+Tab
    fn default() -> Self {
        Self {
            modifiers: Modifiers::CONTROL,
            key_code: codes::TAB,
        }
    }
}

impl Hotkey {
    /// Whether a key-down with these modifiers triggers the hotkey
    pub fn matches(&self, modifiers: Modifiers, key_code: u16) -> bool {
        self.key_code == key_code && self.modifiers == modifiers
    }
}

/// Errors from parsing a hotkey description such as `ctrl+tab`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseHotkeyError {
    #[error("no key found in hotkey {0:?}")]
    MissingKey(String),

    #[error("more than one key in hotkey {0:?}")]
    MultipleKeys(String),

    #[error("unknown key {0:?}")]
    UnknownKey(String),
}

fn parse_key_code(token: &str) -> Option<u16> {
    match token {
        "tab" => return Some(codes::TAB),
        "space" => return Some(codes::SPACE),
        "return" | "enter" => return Some(codes::RETURN),
        "esc" | "escape" => return Some(codes::ESCAPE),
        _ => {}
    }

    let mut chars = token.chars();
    if let (Some(ch), None) = (chars.next(), chars.clone().next()) {
        if ch.is_ascii_lowercase() {
            return Some(codes::LETTERS[(ch as u8 - b'a') as usize]);
        }
    }

    let n: usize = token.strip_prefix('f')?.parse().ok()?;
    codes::FUNCTION.get(n.checked_sub(1)?).copied()
}

impl FromStr for Hotkey {
    type Err = ParseHotkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut modifiers = Modifiers::default();
        let mut key_code = None;

        for token in s.split('+') {
            let token = token.trim().to_ascii_lowercase();
            match token.as_str() {
                "ctrl" | "control" => modifiers.control = true,
                "alt" | "opt" | "option" => modifiers.option = true,
                "cmd" | "command" | "super" => modifiers.command = true,
                "shift" => modifiers.shift = true,
                _ => {
                    if key_code.is_some() {
                        return Err(ParseHotkeyError::MultipleKeys(s.to_string()));
                    }
                    let code = parse_key_code(&token)
                        .ok_or_else(|| ParseHotkeyError::UnknownKey(token.clone()))?;
                    key_code = Some(code);
                }
            }
        }

        let key_code = key_code.ok_or_else(|| ParseHotkeyError::MissingKey(s.to_string()))?;
        Ok(Self {
            modifiers,
            key_code,
        })
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = &self.modifiers;
        for (held, name) in [
            (m.control, "Ctrl+"),
            (m.option, "Option+"),
            (m.command, "Cmd+"),
            (m.shift, "Shift+"),
        ] {
            if held {
                f.write_str(name)?;
            }
        }
        match self.key_code {
            codes::TAB => f.write_str("Tab"),
            codes::SPACE => f.write_str("Space"),
            codes::RETURN => f.write_str("Return"),
            codes::ESCAPE => f.write_str("Escape"),
            code => {
                if let Some(i) = codes::LETTERS.iter().position(|&c| c == code) {
                    write!(f, "{}", char::from(b'A' + i as u8))
                } else if let Some(i) = codes::FUNCTION.iter().position(|&c| c == code) {
                    write!(f, "F{}", i + 1)
                } else {
                    write!(f, "0x{code:02X}")
                }
            }
        }
    }
}
