//! Sway IPC abstraction and the switcher's sway host.
//!
//! `SwayClient` wraps the blocking IPC calls so they can be swapped out;
//! `SwayHost` implements the switch session's `Host` on top of it.

use crate::host::{Frame, Host};
use crate::overlay::{GridSize, WorkspaceCoord};
use crate::ui_commands::{OverlayId, UiCommand};
use crate::window_manager::{
    collect_windows, eligible_windows, find_focused_window, FocusHistory, WindowDetails, WindowInfo,
    WindowRef,
};
use anyhow::Result;
use std::collections::HashMap;
use swayipc::{Connection, Node, Workspace};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Trait for Sway IPC operations.
pub trait SwayClient {
    /// Get the full window tree from Sway
    fn get_tree(&mut self) -> Result<Node>;

    /// Get the list of workspaces
    fn get_workspaces(&mut self) -> Result<Vec<Workspace>>;

    /// Run a sway command
    fn run_command(&mut self, command: &str) -> Result<()>;
}

/// Real implementation using swayipc
pub struct RealSwayClient {
    connection: Connection,
}

impl RealSwayClient {
    /// Create a new connection to Sway
    pub fn new() -> Result<Self> {
        let connection = Connection::new()?;
        Ok(RealSwayClient { connection })
    }
}

impl SwayClient for RealSwayClient {
    fn get_tree(&mut self) -> Result<Node> {
        Ok(self.connection.get_tree()?)
    }

    fn get_workspaces(&mut self) -> Result<Vec<Workspace>> {
        Ok(self.connection.get_workspaces()?)
    }

    fn run_command(&mut self, command: &str) -> Result<()> {
        for outcome in self.connection.run_command(command)? {
            outcome?;
        }
        Ok(())
    }
}

/// The parts of a sway workspace the overlay grid cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
struct WorkspaceSlot {
    num: i32,
    name: String,
    visible: bool,
}

impl From<&Workspace> for WorkspaceSlot {
    fn from(ws: &Workspace) -> Self {
        WorkspaceSlot {
            num: ws.num,
            name: ws.name.clone(),
            visible: ws.visible,
        }
    }
}

/// Lay out an output's workspaces as a single row, numbered workspaces
/// first in numeric order, named ones after them by name.
fn workspace_row(mut slots: Vec<WorkspaceSlot>) -> (GridSize, WorkspaceCoord) {
    slots.sort_by(|a, b| {
        (a.num < 0, a.num, &a.name).cmp(&(b.num < 0, b.num, &b.name))
    });
    let current = slots.iter().position(|s| s.visible).unwrap_or(0);
    (GridSize::new(slots.len().max(1), 1), WorkspaceCoord::new(current, 0))
}

/// `Host` implementation backed by sway IPC and the GTK overlay thread.
pub struct SwayHost<C: SwayClient = RealSwayClient> {
    client: C,
    history: FocusHistory,
    known: HashMap<WindowRef, WindowInfo>,
    /// Output name -> workspace that was visible when the scope was granted
    claimed: HashMap<String, String>,
    ui_tx: Option<mpsc::UnboundedSender<UiCommand>>,
    next_overlay: u32,
}

impl SwayHost<RealSwayClient> {
    pub fn new(ui_tx: Option<mpsc::UnboundedSender<UiCommand>>) -> Result<Self> {
        let client = RealSwayClient::new()?;
        Ok(Self::with_client(client, ui_tx))
    }
}

impl<C: SwayClient> SwayHost<C> {
    /// Create a SwayHost with a custom SwayClient (for testing)
    pub fn with_client(client: C, ui_tx: Option<mpsc::UnboundedSender<UiCommand>>) -> Self {
        SwayHost {
            client,
            history: FocusHistory::new(),
            known: HashMap::new(),
            claimed: HashMap::new(),
            ui_tx,
            next_overlay: 0,
        }
    }

    pub fn on_focus(&mut self, window: WindowRef) {
        self.history.on_focus(window);
    }

    /// The compositor destroyed `window`.
    pub fn on_window_closed(&mut self, window: WindowRef) {
        self.history.forget(window);
        self.known.remove(&window);
    }

    /// Refresh the title of a window from the last snapshot. Returns
    /// whether the window was known.
    pub fn on_title_changed(&mut self, window: WindowRef, title: String) -> bool {
        match self.known.get_mut(&window) {
            Some(info) => {
                info.title = title;
                true
            }
            None => false,
        }
    }

    /// Output owning the focused workspace.
    pub fn focused_output(&mut self) -> Option<String> {
        match self.client.get_workspaces() {
            Ok(workspaces) => workspaces.into_iter().find(|w| w.focused).map(|w| w.output),
            Err(e) => {
                warn!("Failed to query workspaces: {}", e);
                None
            }
        }
    }

    /// Scopes whose output no longer shows the workspace the session
    /// started on. Sway switched workspace underneath the switcher, which
    /// counts as sway taking the scope back; the claims are dropped here.
    pub fn take_revoked_scopes(&mut self) -> Vec<String> {
        if self.claimed.is_empty() {
            return Vec::new();
        }
        let workspaces = match self.client.get_workspaces() {
            Ok(workspaces) => workspaces,
            Err(e) => {
                warn!("Failed to query workspaces: {}", e);
                return Vec::new();
            }
        };

        let revoked: Vec<String> = self
            .claimed
            .iter()
            .filter(|(output, workspace)| {
                !workspaces
                    .iter()
                    .any(|w| &w.output == *output && w.visible && &w.name == *workspace)
            })
            .map(|(output, _)| output.clone())
            .collect();

        for output in &revoked {
            info!("Workspace changed on {}, revoking switcher scope", output);
            self.claimed.remove(output);
        }
        revoked
    }

    fn visible_workspace(&mut self, output: &str) -> Option<String> {
        match self.client.get_workspaces() {
            Ok(workspaces) => workspaces
                .into_iter()
                .find(|w| w.output == output && w.visible)
                .map(|w| w.name),
            Err(e) => {
                warn!("Failed to query workspaces: {}", e);
                None
            }
        }
    }

    fn workspace_slots(&mut self, output: &str) -> Vec<WorkspaceSlot> {
        match self.client.get_workspaces() {
            Ok(workspaces) => workspaces
                .iter()
                .filter(|w| w.output == output)
                .map(WorkspaceSlot::from)
                .collect(),
            Err(e) => {
                warn!("Failed to query workspaces: {}", e);
                Vec::new()
            }
        }
    }

    fn send_ui(&self, command: UiCommand) {
        let Some(tx) = &self.ui_tx else {
            return;
        };
        if let Err(e) = tx.send(command) {
            error!("Failed to send UI command: {}", e);
        }
    }
}

impl<C: SwayClient> Host for SwayHost<C> {
    type Overlay = OverlayId;

    fn enumerate_eligible_windows(&mut self, scope: &str) -> Vec<WindowInfo> {
        let Some(workspace) = self.visible_workspace(scope) else {
            warn!("No visible workspace on output {}", scope);
            return Vec::new();
        };
        let tree = match self.client.get_tree() {
            Ok(tree) => tree,
            Err(e) => {
                warn!("Failed to get sway tree: {}", e);
                return Vec::new();
            }
        };

        if let Some(focused) = find_focused_window(&tree) {
            self.history.observe_focused(focused);
        }

        let mut windows = collect_windows(&tree);
        self.history.apply(&mut windows);
        self.known = windows.iter().map(|w| (w.id, w.clone())).collect();

        let eligible = eligible_windows(windows, &workspace);
        debug!("{} eligible windows on workspace {}", eligible.len(), workspace);
        eligible
    }

    fn window_details(&self, window: WindowRef) -> Option<WindowDetails> {
        self.known.get(&window).map(WindowDetails::from)
    }

    fn acquire_exclusive_input_scope(&mut self, scope: &str) -> bool {
        if self.claimed.contains_key(scope) {
            return false;
        }
        let Some(workspace) = self.visible_workspace(scope) else {
            return false;
        };
        self.claimed.insert(scope.to_string(), workspace);
        true
    }

    fn release_exclusive_input_scope(&mut self, scope: &str) {
        self.claimed.remove(scope);
    }

    fn focus_and_raise(&mut self, window: WindowRef) {
        // Sway has no minimize, focusing also raises floating windows
        match self.client.run_command(&format!("[{}] focus", window)) {
            Ok(()) => self.history.on_focus(window),
            Err(e) => error!("Failed to focus {}: {}", window, e),
        }
    }

    fn workspace_grid(&mut self, scope: &str) -> GridSize {
        workspace_row(self.workspace_slots(scope)).0
    }

    fn current_workspace(&mut self, scope: &str) -> WorkspaceCoord {
        workspace_row(self.workspace_slots(scope)).1
    }

    fn create_overlay(&mut self, scope: &str, _coord: WorkspaceCoord) -> OverlayId {
        self.next_overlay += 1;
        let id = OverlayId(self.next_overlay);
        self.send_ui(UiCommand::CreateOverlay {
            id,
            output: scope.to_string(),
        });
        id
    }

    fn destroy_overlay(&mut self, overlay: OverlayId) {
        self.send_ui(UiCommand::DestroyOverlay { id: overlay });
    }

    fn request_redraw(&mut self, overlay: &OverlayId, frame: Frame) {
        self.send_ui(UiCommand::Redraw { id: *overlay, frame });
    }
}
