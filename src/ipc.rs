use crate::keybinding::{KeyEvent, Keybinding, Modifiers, ParseKeybindingError};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tokio::sync::oneshot;

/// Commands sent from CLI client to daemon
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpcCommand {
    /// Activation key pressed with the given binding
    Press(Keybinding),
    /// A key was released
    Release(String),
    /// Query the session on the focused output
    Status,
    /// Shutdown the daemon gracefully
    Shutdown,
}

impl IpcCommand {
    /// Key event carried by `press`/`release`, if any.
    pub fn key_event(&self) -> Option<KeyEvent> {
        match self {
            IpcCommand::Press(binding) => Some(KeyEvent::pressed(binding.key.clone(), binding.modifiers)),
            IpcCommand::Release(key) => Some(KeyEvent::released(key.clone(), Modifiers::empty())),
            IpcCommand::Status | IpcCommand::Shutdown => None,
        }
    }
}

/// Response from daemon to CLI client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IpcResponse {
    /// Command executed successfully
    Ok,
    /// Error occurred
    Error(String),
    /// Status response
    Status {
        active: bool,
        window_count: usize,
        selected: Option<usize>,
    },
}

/// A parsed command plus the channel its response goes back on.
#[derive(Debug)]
pub struct IpcRequest {
    pub command: IpcCommand,
    pub reply: oneshot::Sender<IpcResponse>,
}

/// Get the path to the Unix socket
pub fn get_socket_path() -> Result<PathBuf> {
    let runtime_dir = dirs::runtime_dir()
        .or_else(dirs::cache_dir)
        .context("Could not determine runtime directory")?;

    Ok(runtime_dir.join("sway-switcher.sock"))
}

/// Error returned when parsing an invalid IpcCommand string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseIpcCommandError {
    #[error("invalid IPC command")]
    Unknown,
    #[error("missing argument for {0}")]
    MissingArgument(&'static str),
    #[error("unexpected argument for {0}")]
    UnexpectedArgument(&'static str),
    #[error(transparent)]
    Binding(#[from] ParseKeybindingError),
}

impl FromStr for IpcCommand {
    type Err = ParseIpcCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (verb, rest) = match s.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (s, ""),
        };

        let no_args = |name: &'static str, command: IpcCommand| {
            if rest.is_empty() {
                Ok(command)
            } else {
                Err(ParseIpcCommandError::UnexpectedArgument(name))
            }
        };

        match verb.to_lowercase().as_str() {
            "press" if rest.is_empty() => Err(ParseIpcCommandError::MissingArgument("press")),
            "press" => Ok(IpcCommand::Press(rest.parse()?)),
            "release" if rest.is_empty() => Err(ParseIpcCommandError::MissingArgument("release")),
            "release" => Ok(IpcCommand::Release(rest.to_uppercase())),
            "status" => no_args("status", IpcCommand::Status),
            "shutdown" => no_args("shutdown", IpcCommand::Shutdown),
            _ => Err(ParseIpcCommandError::Unknown),
        }
    }
}

impl fmt::Display for IpcCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpcCommand::Press(binding) => write!(f, "press {}", binding),
            IpcCommand::Release(key) => write!(f, "release {}", key),
            IpcCommand::Status => write!(f, "status"),
            IpcCommand::Shutdown => write!(f, "shutdown"),
        }
    }
}
