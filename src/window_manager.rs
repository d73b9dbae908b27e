use std::collections::HashMap;
use std::fmt;
use swayipc::{Node, NodeType};
use tracing::debug;

/// Name sway gives the hidden workspace backing the scratchpad.
const SCRATCHPAD_WORKSPACE: &str = "__i3_scratch";

/// Opaque handle to a window owned by the compositor.
///
/// Only identity is meaningful; everything else about the window has to be
/// asked of the host while the handle is still known to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowRef(i64);

impl WindowRef {
    pub fn new(id: i64) -> Self {
        WindowRef(id)
    }

    pub fn id(self) -> i64 {
        self.0
    }
}

impl fmt::Display for WindowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "con_id={}", self.0)
    }
}

/// Snapshot of one window as reported by the compositor.
#[derive(Debug, Clone)]
pub struct WindowInfo {
    pub id: WindowRef,
    pub app_id: Option<String>,
    pub title: String,
    pub workspace: String,
    pub output: Option<String>,
    pub window_class: Option<String>, // WM_CLASS for X11 windows
    pub last_focused: u64,
    pub mapped: bool,
    pub minimized: bool,
}

impl WindowInfo {
    pub fn from_node(node: &Node, workspace: &str, output: Option<&str>) -> Option<Self> {
        // Windows have a pid, containers don't
        let is_view = matches!(node.node_type, NodeType::Con | NodeType::FloatingCon);
        if !is_view || node.pid.is_none() {
            return None;
        }

        let window_class = node
            .window_properties
            .as_ref()
            .and_then(|props| props.class.clone());

        Some(WindowInfo {
            id: WindowRef::new(node.id),
            app_id: node.app_id.clone(),
            title: node.name.clone().unwrap_or_default(),
            workspace: workspace.to_string(),
            output: output.map(str::to_string),
            window_class,
            last_focused: 0,
            mapped: true,
            minimized: workspace == SCRATCHPAD_WORKSPACE,
        })
    }

    /// Identifier used for icon lookup: Wayland app id, else X11 class.
    pub fn icon_key(&self) -> &str {
        self.app_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .or(self.window_class.as_deref())
            .unwrap_or("")
    }

    /// Mapped, not minimized, and on `workspace`.
    pub fn is_eligible(&self, workspace: &str) -> bool {
        self.mapped && !self.minimized && self.workspace == workspace
    }
}

/// Display metadata the switcher asks for at redraw time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowDetails {
    pub title: String,
    pub app_id: String,
}

impl From<&WindowInfo> for WindowDetails {
    fn from(info: &WindowInfo) -> Self {
        WindowDetails {
            title: info.title.clone(),
            app_id: info.icon_key().to_string(),
        }
    }
}

/// Keep only the windows a session may cycle through.
#[must_use]
pub fn eligible_windows(windows: Vec<WindowInfo>, workspace: &str) -> Vec<WindowInfo> {
    windows
        .into_iter()
        .filter(|w| w.is_eligible(workspace))
        .collect()
}

/// Monotonic "last focused" clock for every window seen focused.
///
/// Sway does not expose focus times, so every focus event advances a
/// counter and stamps the window with it.
#[derive(Debug, Default)]
pub struct FocusHistory {
    clock: u64,
    stamps: HashMap<WindowRef, u64>,
}

impl FocusHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `window` received focus now.
    pub fn on_focus(&mut self, window: WindowRef) {
        self.clock += 1;
        self.stamps.insert(window, self.clock);
    }

    /// Stamp `window` unless it already is the most recent focus.
    ///
    /// Used for the focused window found in a tree snapshot, which may
    /// predate the event subscription.
    pub fn observe_focused(&mut self, window: WindowRef) {
        if self.last_focused(window) != self.clock || self.clock == 0 {
            self.on_focus(window);
        }
    }

    /// Timestamp of the last focus, 0 for windows never seen focused.
    pub fn last_focused(&self, window: WindowRef) -> u64 {
        self.stamps.get(&window).copied().unwrap_or(0)
    }

    pub fn forget(&mut self, window: WindowRef) {
        if self.stamps.remove(&window).is_some() {
            debug!("Dropped focus history for {}", window);
        }
    }

    /// Copy stamps onto a fresh snapshot.
    pub fn apply(&self, windows: &mut [WindowInfo]) {
        for window in windows {
            window.last_focused = self.last_focused(window.id);
        }
    }
}

/// Recursively collect all windows from a Sway node tree.
#[must_use]
pub fn collect_windows(node: &Node) -> Vec<WindowInfo> {
    let mut windows = Vec::new();
    collect_into(node, "", None, &mut windows);
    windows
}

fn collect_into<'a>(
    node: &'a Node,
    workspace: &'a str,
    output: Option<&'a str>,
    windows: &mut Vec<WindowInfo>,
) {
    let output = if node.node_type == NodeType::Output {
        node.name.as_deref().or(output)
    } else {
        output
    };
    let workspace = if node.node_type == NodeType::Workspace {
        node.name.as_deref().unwrap_or(workspace)
    } else {
        workspace
    };

    if let Some(window) = WindowInfo::from_node(node, workspace, output) {
        windows.push(window);
    }

    for child in node.nodes.iter().chain(node.floating_nodes.iter()) {
        collect_into(child, workspace, output, windows);
    }
}

/// Find the currently focused window in a Sway node tree.
#[must_use]
pub fn find_focused_window(node: &Node) -> Option<WindowRef> {
    if matches!(node.node_type, NodeType::Con | NodeType::FloatingCon)
        && node.focused
        && node.pid.is_some()
    {
        return Some(WindowRef::new(node.id));
    }

    node.nodes
        .iter()
        .chain(node.floating_nodes.iter())
        .find_map(find_focused_window)
}
