//! Cycling order for a switch session.
//!
//! Most recently focused first, so the first advance lands on the window
//! used before the current one. Equal timestamps (typically windows never
//! seen focused) fall back to ascending window id, which keeps the order
//! independent of how the compositor happened to enumerate them.

use crate::window_manager::{WindowInfo, WindowRef};

/// Order a snapshot of eligible windows for cycling.
#[must_use]
pub fn order(mut windows: Vec<WindowInfo>) -> Vec<WindowRef> {
    windows.sort_by(|a, b| {
        b.last_focused
            .cmp(&a.last_focused)
            .then_with(|| a.id.cmp(&b.id))
    });
    windows.into_iter().map(|w| w.id).collect()
}
