//! What a switch session needs from the compositor it runs inside.
//!
//! All calls are synchronous and infallible from the session's point of
//! view: an implementation that hits an IPC error logs it and answers with
//! the degraded value (empty snapshot, denied scope, no-op focus).

use crate::config::SwitcherStyle;
use crate::overlay::{GridSize, WorkspaceCoord};
use crate::window_manager::{WindowDetails, WindowInfo, WindowRef};
use std::path::PathBuf;

/// One row of the switcher list.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameEntry {
    pub title: String,
    pub icon: PathBuf,
}

/// Everything the presentation side needs to draw the switcher.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub entries: Vec<FrameEntry>,
    pub selected: usize,
    pub style: SwitcherStyle,
}

pub trait Host {
    /// Handle to one overlay surface owned by the host.
    type Overlay;

    /// Mapped, non-minimized windows on the current workspace of `scope`,
    /// with their last-focused timestamps filled in.
    fn enumerate_eligible_windows(&mut self, scope: &str) -> Vec<WindowInfo>;

    /// Title and app id of a window, `None` once the host no longer knows it.
    fn window_details(&self, window: WindowRef) -> Option<WindowDetails>;

    fn acquire_exclusive_input_scope(&mut self, scope: &str) -> bool;

    fn release_exclusive_input_scope(&mut self, scope: &str);

    fn focus_and_raise(&mut self, window: WindowRef);

    fn workspace_grid(&mut self, scope: &str) -> GridSize;

    fn current_workspace(&mut self, scope: &str) -> WorkspaceCoord;

    fn create_overlay(&mut self, scope: &str, coord: WorkspaceCoord) -> Self::Overlay;

    fn destroy_overlay(&mut self, overlay: Self::Overlay);

    /// Fire-and-forget redraw hint.
    fn request_redraw(&mut self, overlay: &Self::Overlay, frame: Frame);
}
