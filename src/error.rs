use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No mapped, non-minimized window on the current workspace
    NoEligibleWindows,
    /// The host refused exclusive input for the session's output
    OwnershipDenied,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::NoEligibleWindows => write!(f, "no windows to switch to"),
            DenyReason::OwnershipDenied => write!(f, "exclusive input not granted"),
        }
    }
}

/// Errors a switch session reports to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwitchError {
    #[error("switcher activation denied: {0}")]
    ActivationDenied(DenyReason),
}
