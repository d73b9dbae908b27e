//! Switch session state machine.
//!
//! A session owns the cycle list and the selection cursor for one output.
//! It is driven entirely from host callbacks (key events, window removal,
//! ownership revocation) and runs each transition to completion before
//! returning. While active the cycle list is never empty and the cursor
//! always indexes into it.
//!
//! `terminate` moves the session to inactive before it calls back into the
//! host, so a host that re-enters the session from `focus_and_raise` or
//! `destroy_overlay` (or delivers a removal while terminating) sees an
//! inactive session and nothing happens twice.

use crate::config::SwitcherOptions;
use crate::error::{DenyReason, SwitchError};
use crate::host::{Frame, FrameEntry, Host};
use crate::icon_resolver::IconResolver;
use crate::keybinding::KeyEvent;
use crate::ordering;
use crate::overlay::OverlayArena;
use crate::window_manager::WindowRef;
use tracing::{debug, info, warn};

#[derive(Debug)]
enum SessionState {
    Inactive,
    Active(CycleState),
}

/// Cycle list and cursor of an active session. `windows` is never empty.
#[derive(Debug)]
struct CycleState {
    windows: Vec<WindowRef>,
    cursor: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Termination {
    /// Modifier released or explicit terminate: focus the selection
    Commit,
    /// The last window disappeared, there is nothing to focus
    NoTarget,
    /// The host took the input scope back itself
    Revoked,
}

/// Result of a window removal notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// The window was not in the cycle list; nothing changed
    Stale,
    /// The window was dropped and the cursor re-validated
    Removed,
    /// The window was the last one and the session ended
    Terminated,
}

pub struct SwitchSession<H: Host> {
    scope: String,
    options: SwitcherOptions,
    icons: IconResolver,
    state: SessionState,
    overlays: OverlayArena<H::Overlay>,
}

impl<H: Host> SwitchSession<H> {
    /// Create an inactive session for the output named `scope`.
    pub fn new(scope: impl Into<String>, options: SwitcherOptions) -> Self {
        SwitchSession {
            scope: scope.into(),
            options,
            icons: IconResolver::new(),
            state: SessionState::Inactive,
            overlays: OverlayArena::new(),
        }
    }

    pub fn with_icon_resolver(mut self, icons: IconResolver) -> Self {
        self.icons = icons;
        self
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn options(&self) -> &SwitcherOptions {
        &self.options
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    /// Current cycle list, empty while inactive.
    pub fn windows(&self) -> &[WindowRef] {
        match &self.state {
            SessionState::Active(cycle) => &cycle.windows,
            SessionState::Inactive => &[],
        }
    }

    pub fn cursor(&self) -> Option<usize> {
        match &self.state {
            SessionState::Active(cycle) => Some(cycle.cursor),
            SessionState::Inactive => None,
        }
    }

    pub fn selected(&self) -> Option<WindowRef> {
        match &self.state {
            SessionState::Active(cycle) => cycle.windows.get(cycle.cursor).copied(),
            SessionState::Inactive => None,
        }
    }

    /// Entry point for key events.
    ///
    /// Returns `Ok(true)` when the event was consumed: a press of the
    /// activation binding (activate or advance), or the release of one of
    /// its modifiers while active (terminate).
    pub fn on_activation_key_event(&mut self, host: &mut H, event: &KeyEvent) -> Result<bool, SwitchError> {
        if self.options.activate.matches_press(event) {
            self.advance(host)?;
            return Ok(true);
        }

        if self.is_active() && self.options.activate.is_release_of_modifier(event) {
            self.terminate(host);
            return Ok(true);
        }

        Ok(false)
    }

    /// Start a session from a fresh window snapshot and select the second
    /// most recent window. Calling it while active advances instead.
    pub fn activate(&mut self, host: &mut H) -> Result<(), SwitchError> {
        if self.is_active() {
            return self.advance(host);
        }

        let windows = ordering::order(host.enumerate_eligible_windows(&self.scope));
        if windows.is_empty() {
            info!("No windows to switch to on {}", self.scope);
            return Err(SwitchError::ActivationDenied(DenyReason::NoEligibleWindows));
        }

        if !host.acquire_exclusive_input_scope(&self.scope) {
            warn!("Input scope {} not granted, switcher stays hidden", self.scope);
            return Err(SwitchError::ActivationDenied(DenyReason::OwnershipDenied));
        }

        info!("Switcher active on {} with {} windows", self.scope, windows.len());
        self.state = SessionState::Active(CycleState { windows, cursor: 0 });
        self.advance(host)
    }

    /// Move the selection to the next window, wrapping at the end.
    /// Activates the session when it is inactive.
    pub fn advance(&mut self, host: &mut H) -> Result<(), SwitchError> {
        let SessionState::Active(cycle) = &mut self.state else {
            return self.activate(host);
        };

        cycle.cursor = (cycle.cursor + 1) % cycle.windows.len();
        debug!("Selected {} ({}/{})", cycle.windows[cycle.cursor], cycle.cursor + 1, cycle.windows.len());

        self.redraw(host);
        Ok(())
    }

    /// Drop a window the host reports as gone.
    ///
    /// A removal at or before the cursor steps the cursor back so it keeps
    /// pointing at a neighbour rather than whatever slid into the slot.
    pub fn on_window_removed(&mut self, host: &mut H, window: WindowRef) -> RemovalOutcome {
        let SessionState::Active(cycle) = &mut self.state else {
            return RemovalOutcome::Stale;
        };
        let Some(index) = cycle.windows.iter().position(|w| *w == window) else {
            debug!("Ignoring removal of {}: not in cycle list", window);
            return RemovalOutcome::Stale;
        };

        cycle.windows.remove(index);
        if cycle.windows.is_empty() {
            info!("Last window closed, ending switcher on {}", self.scope);
            self.finish(host, Termination::NoTarget);
            return RemovalOutcome::Terminated;
        }

        let len = cycle.windows.len();
        if index <= cycle.cursor {
            cycle.cursor = (cycle.cursor + len - 1) % len;
        }
        debug!("Removed {} at {}, cursor now {}", window, index, cycle.cursor);

        self.redraw(host);
        RemovalOutcome::Removed
    }

    /// Redraw after a window in the cycle list changed what is shown for it,
    /// such as its title. Returns whether the window belongs to the session.
    pub fn on_window_changed(&mut self, host: &mut H, window: WindowRef) -> bool {
        let SessionState::Active(cycle) = &self.state else {
            return false;
        };
        if !cycle.windows.contains(&window) {
            return false;
        }
        self.redraw(host);
        true
    }

    /// End the session, focusing the selected window. No-op while inactive.
    pub fn terminate(&mut self, host: &mut H) {
        self.finish(host, Termination::Commit);
    }

    /// The host reclaimed the input scope on its own. Ends the session
    /// without focusing anything or releasing the scope again.
    pub fn on_ownership_revoked(&mut self, host: &mut H) {
        self.finish(host, Termination::Revoked);
    }

    /// Called when the switcher is being unloaded.
    pub fn on_plugin_teardown(&mut self, host: &mut H) {
        if self.is_active() {
            self.terminate(host);
        }
    }

    fn finish(&mut self, host: &mut H, how: Termination) {
        let SessionState::Active(cycle) = std::mem::replace(&mut self.state, SessionState::Inactive) else {
            return;
        };

        if how == Termination::Revoked {
            info!("Input scope {} revoked, switcher closed without focusing", self.scope);
        } else {
            if let Some(window) = cycle.windows.get(cycle.cursor) {
                info!("Focusing {}", window);
                host.focus_and_raise(*window);
            }
            host.release_exclusive_input_scope(&self.scope);
        }

        for overlay in self.overlays.drain() {
            host.destroy_overlay(overlay);
        }
    }

    fn redraw(&mut self, host: &mut H) {
        let SessionState::Active(cycle) = &self.state else {
            return;
        };

        // Icons are resolved per entry on every redraw, never cached
        let entries = cycle
            .windows
            .iter()
            .map(|window| {
                let details = host.window_details(*window);
                let (title, app_id) = details.map(|d| (d.title, d.app_id)).unwrap_or_default();
                FrameEntry {
                    icon: self.icons.resolve(&app_id),
                    title,
                }
            })
            .collect();
        let frame = Frame {
            entries,
            selected: cycle.cursor,
            style: self.options.style.clone(),
        };

        for stale in self.overlays.fit(host.workspace_grid(&self.scope)) {
            host.destroy_overlay(stale);
        }

        let coord = host.current_workspace(&self.scope);
        let scope = &self.scope;
        let overlay = self
            .overlays
            .get_or_create(coord, || host.create_overlay(scope, coord));
        match overlay {
            Some(overlay) => host.request_redraw(overlay, frame),
            None => warn!("Workspace {:?} outside the grid of {}, not drawing", coord, scope),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keybinding::Modifiers;
    use crate::overlay::{GridSize, WorkspaceCoord};
    use crate::window_manager::tests::make_window;
    use crate::window_manager::{WindowDetails, WindowInfo};
    use std::collections::HashSet;
    use std::path::PathBuf;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Enumerate,
        Acquire,
        Release,
        Focus(WindowRef),
        CreateOverlay(WorkspaceCoord),
        DestroyOverlay(u32),
    }

    struct RecordingHost {
        windows: Vec<WindowInfo>,
        grant: bool,
        grid: GridSize,
        workspace: WorkspaceCoord,
        next_overlay: u32,
        live_overlays: HashSet<u32>,
        calls: Vec<Call>,
        frames: Vec<Frame>,
    }

    impl RecordingHost {
        /// Windows 1..=n, window 1 most recently focused.
        fn with_windows(n: i64) -> Self {
            let windows = (1..=n)
                .map(|id| {
                    let mut w = make_window(id, &format!("Window {}", id));
                    w.last_focused = (n - id + 1) as u64;
                    w
                })
                .collect();
            RecordingHost {
                windows,
                grant: true,
                grid: GridSize::new(2, 2),
                workspace: WorkspaceCoord::new(0, 0),
                next_overlay: 0,
                live_overlays: HashSet::new(),
                calls: Vec::new(),
                frames: Vec::new(),
            }
        }

        /// Host forgets the window, as it would after the close event.
        fn close(&mut self, id: i64) -> WindowRef {
            self.windows.retain(|w| w.id.id() != id);
            WindowRef::new(id)
        }

        fn count(&self, call: &Call) -> usize {
            self.calls.iter().filter(|c| *c == call).count()
        }

        fn focused(&self) -> Vec<WindowRef> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Focus(w) => Some(*w),
                    _ => None,
                })
                .collect()
        }

        fn last_frame(&self) -> &Frame {
            self.frames.last().expect("no frame drawn")
        }
    }

    impl Host for RecordingHost {
        type Overlay = u32;

        fn enumerate_eligible_windows(&mut self, _scope: &str) -> Vec<WindowInfo> {
            self.calls.push(Call::Enumerate);
            self.windows.clone()
        }

        fn window_details(&self, window: WindowRef) -> Option<WindowDetails> {
            self.windows.iter().find(|w| w.id == window).map(WindowDetails::from)
        }

        fn acquire_exclusive_input_scope(&mut self, _scope: &str) -> bool {
            self.calls.push(Call::Acquire);
            self.grant
        }

        fn release_exclusive_input_scope(&mut self, _scope: &str) {
            self.calls.push(Call::Release);
        }

        fn focus_and_raise(&mut self, window: WindowRef) {
            self.calls.push(Call::Focus(window));
        }

        fn workspace_grid(&mut self, _scope: &str) -> GridSize {
            self.grid
        }

        fn current_workspace(&mut self, _scope: &str) -> WorkspaceCoord {
            self.workspace
        }

        fn create_overlay(&mut self, _scope: &str, coord: WorkspaceCoord) -> u32 {
            self.calls.push(Call::CreateOverlay(coord));
            self.next_overlay += 1;
            self.live_overlays.insert(self.next_overlay);
            self.next_overlay
        }

        fn destroy_overlay(&mut self, overlay: u32) {
            self.calls.push(Call::DestroyOverlay(overlay));
            self.live_overlays.remove(&overlay);
        }

        fn request_redraw(&mut self, overlay: &u32, frame: Frame) {
            assert!(self.live_overlays.contains(overlay));
            self.frames.push(frame);
        }
    }

    fn session() -> SwitchSession<RecordingHost> {
        SwitchSession::new("eDP-1", SwitcherOptions::default()).with_icon_resolver(
            IconResolver::with_locations(vec![], "/nonexistent-theme", "/generic.svg"),
        )
    }

    fn ids(session: &SwitchSession<RecordingHost>) -> Vec<i64> {
        session.windows().iter().map(|w| w.id()).collect()
    }

    fn assert_invariant(session: &SwitchSession<RecordingHost>) {
        match session.cursor() {
            Some(cursor) => {
                assert!(!session.windows().is_empty());
                assert!(cursor < session.windows().len());
            }
            None => assert!(!session.is_active()),
        }
    }

    #[test]
    fn test_activate_selects_second_most_recent() {
        let mut host = RecordingHost::with_windows(3);
        let mut s = session();

        s.activate(&mut host).unwrap();

        assert!(s.is_active());
        assert_eq!(ids(&s), vec![1, 2, 3]);
        assert_eq!(s.cursor(), Some(1));
        assert_eq!(s.selected(), Some(WindowRef::new(2)));

        let frame = host.last_frame();
        assert_eq!(frame.selected, 1);
        let titles: Vec<&str> = frame.entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Window 1", "Window 2", "Window 3"]);
        assert!(frame.entries.iter().all(|e| e.icon == PathBuf::from("/generic.svg")));
        assert_eq!(frame.style, SwitcherOptions::default().style);
    }

    #[test]
    fn test_changed_title_is_redrawn() {
        let mut host = RecordingHost::with_windows(3);
        let mut s = session();
        s.activate(&mut host).unwrap();
        let drawn = host.frames.len();

        host.windows[1].title = "Renamed".to_string();
        assert!(s.on_window_changed(&mut host, WindowRef::new(2)));

        assert_eq!(host.frames.len(), drawn + 1);
        assert_eq!(host.last_frame().entries[1].title, "Renamed");
        assert_eq!(s.cursor(), Some(1));
    }

    #[test]
    fn test_change_outside_cycle_list_is_ignored() {
        let mut host = RecordingHost::with_windows(2);
        let mut s = session();
        assert!(!s.on_window_changed(&mut host, WindowRef::new(1)));

        s.activate(&mut host).unwrap();
        let drawn = host.frames.len();
        assert!(!s.on_window_changed(&mut host, WindowRef::new(99)));
        assert_eq!(host.frames.len(), drawn);
    }

    #[test]
    fn test_activate_single_window_selects_it() {
        let mut host = RecordingHost::with_windows(1);
        let mut s = session();

        s.activate(&mut host).unwrap();
        assert_eq!(s.cursor(), Some(0));
    }

    #[test]
    fn test_activation_without_windows_is_side_effect_free() {
        let mut host = RecordingHost::with_windows(0);
        let mut s = session();

        let err = s.activate(&mut host).unwrap_err();

        assert_eq!(err, SwitchError::ActivationDenied(DenyReason::NoEligibleWindows));
        assert!(!s.is_active());
        assert_eq!(host.calls, vec![Call::Enumerate]);
        assert!(host.frames.is_empty());
    }

    #[test]
    fn test_activation_denied_ownership() {
        let mut host = RecordingHost::with_windows(2);
        host.grant = false;
        let mut s = session();

        let err = s.activate(&mut host).unwrap_err();

        assert_eq!(err, SwitchError::ActivationDenied(DenyReason::OwnershipDenied));
        assert!(!s.is_active());
        assert_eq!(host.count(&Call::Release), 0);
        assert!(host.frames.is_empty());

        // A later attempt starts from scratch
        host.grant = true;
        s.activate(&mut host).unwrap();
        assert!(s.is_active());
    }

    #[test]
    fn test_advance_wraps_around() {
        let mut host = RecordingHost::with_windows(4);
        let mut s = session();
        s.activate(&mut host).unwrap();
        let start = s.selected();

        for _ in 0..4 {
            s.advance(&mut host).unwrap();
            assert_invariant(&s);
        }

        assert_eq!(s.selected(), start);
    }

    #[test]
    fn test_advance_while_inactive_activates() {
        let mut host = RecordingHost::with_windows(3);
        let mut s = session();

        s.advance(&mut host).unwrap();

        assert!(s.is_active());
        assert_eq!(s.cursor(), Some(1));
        assert_eq!(host.count(&Call::Acquire), 1);
    }

    #[test]
    fn test_activate_while_active_advances() {
        let mut host = RecordingHost::with_windows(3);
        let mut s = session();
        s.activate(&mut host).unwrap();

        s.activate(&mut host).unwrap();

        assert_eq!(s.cursor(), Some(2));
        assert_eq!(host.count(&Call::Enumerate), 1);
        assert_eq!(host.count(&Call::Acquire), 1);
    }

    #[test]
    fn test_removal_before_cursor_keeps_selection() {
        let mut host = RecordingHost::with_windows(4);
        let mut s = session();
        s.activate(&mut host).unwrap();
        s.advance(&mut host).unwrap();
        assert_eq!(s.cursor(), Some(2));

        let b = host.close(2);
        assert_eq!(s.on_window_removed(&mut host, b), RemovalOutcome::Removed);

        assert_eq!(ids(&s), vec![1, 3, 4]);
        assert_eq!(s.cursor(), Some(1));
        assert_eq!(s.selected(), Some(WindowRef::new(3)));
        assert_eq!(host.last_frame().entries.len(), 3);
        assert_eq!(host.last_frame().selected, 1);
    }

    #[test]
    fn test_removal_after_cursor_keeps_cursor() {
        let mut host = RecordingHost::with_windows(4);
        let mut s = session();
        s.activate(&mut host).unwrap();
        assert_eq!(s.cursor(), Some(1));

        let d = host.close(4);
        assert_eq!(s.on_window_removed(&mut host, d), RemovalOutcome::Removed);

        assert_eq!(ids(&s), vec![1, 2, 3]);
        assert_eq!(s.cursor(), Some(1));
        assert_eq!(s.selected(), Some(WindowRef::new(2)));
    }

    #[test]
    fn test_removal_of_selected_steps_back() {
        let mut host = RecordingHost::with_windows(3);
        let mut s = session();
        s.activate(&mut host).unwrap();

        let b = host.close(2);
        s.on_window_removed(&mut host, b);

        assert_eq!(s.selected(), Some(WindowRef::new(1)));
    }

    #[test]
    fn test_removal_at_front_wraps_cursor() {
        let mut host = RecordingHost::with_windows(3);
        let mut s = session();
        s.activate(&mut host).unwrap();
        s.advance(&mut host).unwrap();
        s.advance(&mut host).unwrap();
        assert_eq!(s.cursor(), Some(0));

        let a = host.close(1);
        s.on_window_removed(&mut host, a);

        assert_eq!(ids(&s), vec![2, 3]);
        assert_eq!(s.cursor(), Some(1));
        assert_invariant(&s);
    }

    #[test]
    fn test_removal_collapsing_to_empty_terminates_without_focus() {
        let mut host = RecordingHost::with_windows(1);
        let mut s = session();
        s.activate(&mut host).unwrap();
        assert_eq!(s.cursor(), Some(0));

        let a = host.close(1);
        assert_eq!(s.on_window_removed(&mut host, a), RemovalOutcome::Terminated);

        assert!(!s.is_active());
        assert!(host.focused().is_empty());
        assert_eq!(host.count(&Call::Release), 1);
        assert!(host.live_overlays.is_empty());
    }

    #[test]
    fn test_stale_removal_changes_nothing() {
        let mut host = RecordingHost::with_windows(3);
        let mut s = session();

        // Inactive: nothing to remove from
        assert_eq!(s.on_window_removed(&mut host, WindowRef::new(1)), RemovalOutcome::Stale);

        s.activate(&mut host).unwrap();
        let frames = host.frames.len();
        let calls = host.calls.len();

        assert_eq!(s.on_window_removed(&mut host, WindowRef::new(99)), RemovalOutcome::Stale);

        assert_eq!(ids(&s), vec![1, 2, 3]);
        assert_eq!(s.cursor(), Some(1));
        assert_eq!(host.frames.len(), frames);
        assert_eq!(host.calls.len(), calls);
    }

    #[test]
    fn test_terminate_focuses_selection_once() {
        let mut host = RecordingHost::with_windows(3);
        let mut s = session();
        s.activate(&mut host).unwrap();

        s.terminate(&mut host);
        s.terminate(&mut host);

        assert!(!s.is_active());
        assert_eq!(host.focused(), vec![WindowRef::new(2)]);
        assert_eq!(host.count(&Call::Release), 1);
        assert!(s.windows().is_empty());
        assert_eq!(s.cursor(), None);
    }

    #[test]
    fn test_focus_happens_before_release() {
        let mut host = RecordingHost::with_windows(2);
        let mut s = session();
        s.activate(&mut host).unwrap();
        s.terminate(&mut host);

        let focus = host.calls.iter().position(|c| matches!(c, Call::Focus(_))).unwrap();
        let release = host.calls.iter().position(|c| *c == Call::Release).unwrap();
        assert!(focus < release);
    }

    #[test]
    fn test_revocation_skips_focus_and_release() {
        let mut host = RecordingHost::with_windows(3);
        let mut s = session();
        s.activate(&mut host).unwrap();

        s.on_ownership_revoked(&mut host);

        assert!(!s.is_active());
        assert!(host.focused().is_empty());
        assert_eq!(host.count(&Call::Release), 0);
        assert!(host.live_overlays.is_empty());
    }

    #[test]
    fn test_teardown_terminates_active_session() {
        let mut host = RecordingHost::with_windows(2);
        let mut s = session();

        s.on_plugin_teardown(&mut host);
        assert!(host.calls.is_empty());

        s.activate(&mut host).unwrap();
        s.on_plugin_teardown(&mut host);
        assert!(!s.is_active());
        assert_eq!(host.focused(), vec![WindowRef::new(2)]);
    }

    #[test]
    fn test_key_events_drive_the_session() {
        let mut host = RecordingHost::with_windows(3);
        let mut s = session();
        let tab = KeyEvent::pressed("KEY_TAB", Modifiers::ALT);

        assert_eq!(s.on_activation_key_event(&mut host, &tab), Ok(true));
        assert_eq!(s.cursor(), Some(1));

        assert_eq!(s.on_activation_key_event(&mut host, &tab), Ok(true));
        assert_eq!(s.cursor(), Some(2));

        let shift_up = KeyEvent::released("KEY_LEFTSHIFT", Modifiers::ALT);
        assert_eq!(s.on_activation_key_event(&mut host, &shift_up), Ok(false));
        assert!(s.is_active());

        let alt_up = KeyEvent::released("KEY_LEFTALT", Modifiers::empty());
        assert_eq!(s.on_activation_key_event(&mut host, &alt_up), Ok(true));
        assert!(!s.is_active());
        assert_eq!(host.focused(), vec![WindowRef::new(3)]);
    }

    #[test]
    fn test_key_events_ignored_when_unrelated() {
        let mut host = RecordingHost::with_windows(3);
        let mut s = session();

        let plain_tab = KeyEvent::pressed("KEY_TAB", Modifiers::empty());
        assert_eq!(s.on_activation_key_event(&mut host, &plain_tab), Ok(false));

        // Releasing alt while inactive is not ours to handle
        let alt_up = KeyEvent::released("KEY_LEFTALT", Modifiers::empty());
        assert_eq!(s.on_activation_key_event(&mut host, &alt_up), Ok(false));
        assert!(host.calls.is_empty());
    }

    #[test]
    fn test_key_event_reports_denied_activation() {
        let mut host = RecordingHost::with_windows(0);
        let mut s = session();
        let tab = KeyEvent::pressed("KEY_TAB", Modifiers::ALT);

        assert_eq!(
            s.on_activation_key_event(&mut host, &tab),
            Err(SwitchError::ActivationDenied(DenyReason::NoEligibleWindows))
        );
    }

    #[test]
    fn test_vanished_window_still_drawn_with_fallback() {
        let mut host = RecordingHost::with_windows(3);
        let mut s = session();
        s.activate(&mut host).unwrap();

        // Host already forgot window 3 but the removal has not arrived yet
        host.close(3);
        s.advance(&mut host).unwrap();

        let frame = host.last_frame();
        assert_eq!(frame.entries[2].title, "");
        assert_eq!(frame.entries[2].icon, PathBuf::from("/generic.svg"));
    }

    #[test]
    fn test_overlay_created_per_workspace_and_torn_down() {
        let mut host = RecordingHost::with_windows(3);
        let mut s = session();
        s.activate(&mut host).unwrap();
        s.advance(&mut host).unwrap();

        host.workspace = WorkspaceCoord::new(1, 1);
        s.advance(&mut host).unwrap();

        assert_eq!(host.count(&Call::CreateOverlay(WorkspaceCoord::new(0, 0))), 1);
        assert_eq!(host.count(&Call::CreateOverlay(WorkspaceCoord::new(1, 1))), 1);
        assert_eq!(host.live_overlays.len(), 2);

        s.terminate(&mut host);
        assert!(host.live_overlays.is_empty());
    }

    #[test]
    fn test_outside_grid_skips_drawing() {
        let mut host = RecordingHost::with_windows(2);
        host.workspace = WorkspaceCoord::new(5, 0);
        let mut s = session();

        s.activate(&mut host).unwrap();

        assert!(s.is_active());
        assert!(host.frames.is_empty());
    }

    #[test]
    fn test_invariant_holds_under_mixed_events() {
        let mut host = RecordingHost::with_windows(8);
        let mut s = session();
        s.activate(&mut host).unwrap();

        // Small LCG so the sequence is reproducible
        let mut seed: u64 = 0x2545_f491;
        let mut next = move || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            seed >> 33
        };

        while s.is_active() {
            if next() % 3 == 0 {
                let victim = (next() % 10) as i64 + 1;
                host.close(victim);
                s.on_window_removed(&mut host, WindowRef::new(victim));
            } else {
                s.advance(&mut host).unwrap();
            }
            assert_invariant(&s);
        }

        assert!(host.focused().is_empty());
        assert!(host.live_overlays.is_empty());
    }
}
