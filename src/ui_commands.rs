use crate::host::Frame;

/// Identifies one overlay window on the GTK side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayId(pub u32);

/// Commands sent from daemon to UI
#[derive(Debug, Clone)]
pub enum UiCommand {
    /// Create an (initially hidden) overlay window on the given output
    CreateOverlay { id: OverlayId, output: String },
    /// Redraw an overlay with a new window list and selection
    Redraw { id: OverlayId, frame: Frame },
    /// Hide and destroy an overlay window
    DestroyOverlay { id: OverlayId },
}
