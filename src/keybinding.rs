//! Key bindings and the key events fed into a switch session.
//!
//! Bindings use the `<mod> KEY_NAME` syntax, e.g. `<alt> KEY_TAB` or
//! `<super> <shift> KEY_TAB`. Key names are evdev names.

use bitflags::bitflags;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

bitflags! {
    /// Modifier mask held while a key event was produced.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const ALT = 1 << 0;
        const CTRL = 1 << 1;
        const SHIFT = 1 << 2;
        const SUPER = 1 << 3;
    }
}

impl Modifiers {
    /// Modifier flag a physical key contributes, empty for ordinary keys.
    pub fn from_key(key: &str) -> Modifiers {
        match key {
            "KEY_LEFTALT" | "KEY_RIGHTALT" => Modifiers::ALT,
            "KEY_LEFTCTRL" | "KEY_RIGHTCTRL" => Modifiers::CTRL,
            "KEY_LEFTSHIFT" | "KEY_RIGHTSHIFT" => Modifiers::SHIFT,
            "KEY_LEFTMETA" | "KEY_RIGHTMETA" => Modifiers::SUPER,
            _ => Modifiers::empty(),
        }
    }

    fn from_token(token: &str) -> Option<Modifiers> {
        match token.to_lowercase().as_str() {
            "alt" => Some(Modifiers::ALT),
            "ctrl" | "control" => Some(Modifiers::CTRL),
            "shift" => Some(Modifiers::SHIFT),
            "super" | "logo" | "meta" => Some(Modifiers::SUPER),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// A single key transition as delivered by the key event source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub modifiers: Modifiers,
    pub state: KeyState,
}

impl KeyEvent {
    pub fn pressed(key: impl Into<String>, modifiers: Modifiers) -> Self {
        KeyEvent {
            key: key.into(),
            modifiers,
            state: KeyState::Pressed,
        }
    }

    pub fn released(key: impl Into<String>, modifiers: Modifiers) -> Self {
        KeyEvent {
            key: key.into(),
            modifiers,
            state: KeyState::Released,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseKeybindingError {
    #[error("key binding is empty")]
    Empty,
    #[error("unknown modifier <{0}>")]
    UnknownModifier(String),
    #[error("expected exactly one key name, found {0}")]
    KeyCount(usize),
    #[error("key name must start with KEY_: {0}")]
    BadKeyName(String),
}

/// Activation binding: a key plus the modifiers that must be held with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keybinding {
    pub modifiers: Modifiers,
    pub key: String,
}

impl Keybinding {
    /// True if `event` is a press of the bound key with at least the bound modifiers held.
    pub fn matches_press(&self, event: &KeyEvent) -> bool {
        event.state == KeyState::Pressed
            && event.key == self.key
            && event.modifiers.contains(self.modifiers)
    }

    /// True if `event` releases one of the binding's modifier keys.
    pub fn is_release_of_modifier(&self, event: &KeyEvent) -> bool {
        event.state == KeyState::Released
            && Modifiers::from_key(&event.key).intersects(self.modifiers)
    }
}

impl FromStr for Keybinding {
    type Err = ParseKeybindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut modifiers = Modifiers::empty();
        let mut keys = Vec::new();

        // "<alt><shift> KEY_TAB" is accepted as well as the spaced form
        let spaced = s.replace('>', "> ");
        for token in spaced.split_whitespace() {
            if let Some(name) = token.strip_prefix('<').and_then(|t| t.strip_suffix('>')) {
                let flag = Modifiers::from_token(name)
                    .ok_or_else(|| ParseKeybindingError::UnknownModifier(name.to_string()))?;
                modifiers |= flag;
            } else {
                keys.push(token);
            }
        }

        if modifiers.is_empty() && keys.is_empty() {
            return Err(ParseKeybindingError::Empty);
        }
        if keys.len() != 1 {
            return Err(ParseKeybindingError::KeyCount(keys.len()));
        }

        let key = keys[0].to_uppercase();
        if !key.starts_with("KEY_") {
            return Err(ParseKeybindingError::BadKeyName(keys[0].to_string()));
        }

        Ok(Keybinding { modifiers, key })
    }
}

impl fmt::Display for Keybinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, flag) in [
            ("super", Modifiers::SUPER),
            ("ctrl", Modifiers::CTRL),
            ("alt", Modifiers::ALT),
            ("shift", Modifiers::SHIFT),
        ] {
            if self.modifiers.contains(flag) {
                write!(f, "<{}> ", name)?;
            }
        }
        write!(f, "{}", self.key)
    }
}
