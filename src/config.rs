use crate::keybinding::Keybinding;
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum InputSource {
    /// Key events arrive as `press`/`release` commands on the IPC socket
    Ipc,
    /// Key events are read directly from an evdev keyboard device
    Evdev,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run as daemon (default if no command specified)
    Daemon,
    /// Deliver an activation key press, e.g. `press '<alt> KEY_TAB'`
    Press {
        /// Binding that was pressed
        binding: String,
    },
    /// Deliver a key release, e.g. `release KEY_LEFTALT`
    Release {
        /// Evdev name of the released key
        key: String,
    },
    /// Query the session on the focused output
    Status,
    /// Shutdown the daemon
    Shutdown,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "sway-switcher")]
#[command(about = "Most-recently-used window switcher overlay for Sway", long_about = None)]
pub struct Config {
    /// Binding that activates the switcher and advances the selection
    #[arg(long, default_value = "<alt> KEY_TAB")]
    pub activate: Keybinding,

    /// Overlay background color (#RRGGBB, #RRGGBBAA or "r g b a")
    #[arg(long, default_value = "#1A1A1AE6")]
    pub background_color: Color,

    /// Title text color (#RRGGBB, #RRGGBBAA or "r g b a")
    #[arg(long, default_value = "#FFFFFFFF")]
    pub text_color: Color,

    /// Pango font description used for window titles
    #[arg(long, default_value = "sans-serif 12")]
    pub font: String,

    /// Where key events come from (only applies to daemon mode)
    #[arg(long, value_enum, default_value = "ipc")]
    pub input: InputSource,

    /// Evdev keyboard device to read when --input=evdev
    #[arg(long)]
    pub device: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Config {
    pub fn parse() -> Self {
        <Config as Parser>::parse()
    }

    /// Get the command, defaulting to Daemon if none specified
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Daemon)
    }

    /// Options handed to each switch session.
    pub fn switcher_options(&self) -> SwitcherOptions {
        SwitcherOptions {
            activate: self.activate.clone(),
            style: SwitcherStyle {
                background_color: self.background_color,
                text_color: self.text_color,
                font: self.font.clone(),
            },
        }
    }
}

/// Configuration a switch session holds for its whole lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitcherOptions {
    pub activate: Keybinding,
    pub style: SwitcherStyle,
}

/// Rendering options. The session never interprets these, it only
/// forwards them to the presentation side with every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitcherStyle {
    pub background_color: Color,
    pub text_color: Color,
    pub font: String,
}

impl Default for SwitcherOptions {
    fn default() -> Self {
        SwitcherOptions {
            activate: Keybinding {
                modifiers: crate::keybinding::Modifiers::ALT,
                key: "KEY_TAB".to_string(),
            },
            style: SwitcherStyle {
                background_color: Color::new(0.1, 0.1, 0.1, 0.9),
                text_color: Color::new(1.0, 1.0, 1.0, 1.0),
                font: "sans-serif 12".to_string(),
            },
        }
    }
}

/// RGBA color with channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Color { r, g, b, a }
    }

    /// CSS `rgba()` notation for GTK style sheets.
    pub fn to_css(&self) -> String {
        format!(
            "rgba({}, {}, {}, {:.3})",
            (self.r * 255.0).round() as u8,
            (self.g * 255.0).round() as u8,
            (self.b * 255.0).round() as u8,
            self.a
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color {0:?}: expected #RRGGBB, #RRGGBBAA or four floats")]
pub struct ParseColorError(String);

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || ParseColorError(s.to_string());

        if let Some(hex) = s.strip_prefix('#') {
            if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(err());
            }
            let channel = |i: usize| {
                u8::from_str_radix(&hex[i..i + 2], 16)
                    .map(|v| f64::from(v) / 255.0)
                    .map_err(|_| err())
            };
            let alpha = if hex.len() == 8 { channel(6)? } else { 1.0 };
            return Ok(Color::new(channel(0)?, channel(2)?, channel(4)?, alpha));
        }

        let parts: Vec<f64> = s
            .split_whitespace()
            .map(|p| p.parse::<f64>().map_err(|_| err()))
            .collect::<Result<_, _>>()?;
        match parts.as_slice() {
            [r, g, b, a] if parts.iter().all(|v| (0.0..=1.0).contains(v)) => {
                Ok(Color::new(*r, *g, *b, *a))
            }
            _ => Err(err()),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.r, self.g, self.b, self.a)
    }
}
