use crate::config::SwitcherOptions;
use crate::ipc::{IpcCommand, IpcRequest, IpcResponse};
use crate::keybinding::KeyEvent;
use crate::sway_client::{RealSwayClient, SwayClient, SwayHost};
use crate::ui_commands::UiCommand;
use crate::window_manager::WindowRef;
use crate::window_switcher::{RemovalOutcome, SwitchSession};
use anyhow::Result;
use futures_lite::stream::StreamExt;
use std::collections::HashMap;
use swayipc_async::{Connection, Event, EventType, WindowChange, WorkspaceChange};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
enum SwayEvent {
    Focus(WindowRef),
    Closed(WindowRef),
    Title(WindowRef, String),
    WorkspaceFocused,
}

/// Owns the sway host and one switch session per output.
pub struct Daemon<C: SwayClient = RealSwayClient> {
    host: SwayHost<C>,
    options: SwitcherOptions,
    sessions: HashMap<String, SwitchSession<SwayHost<C>>>,
}

impl Daemon<RealSwayClient> {
    pub fn new(options: SwitcherOptions, ui_tx: Option<mpsc::UnboundedSender<UiCommand>>) -> Result<Self> {
        let host = SwayHost::new(ui_tx)?;
        Ok(Self::with_host(host, options))
    }
}

impl<C: SwayClient> Daemon<C> {
    pub fn with_host(host: SwayHost<C>, options: SwitcherOptions) -> Self {
        Daemon {
            host,
            options,
            sessions: HashMap::new(),
        }
    }

    /// Main event loop
    pub async fn run(
        mut self,
        mut key_rx: mpsc::UnboundedReceiver<KeyEvent>,
        mut ipc_rx: mpsc::UnboundedReceiver<IpcRequest>,
    ) -> Result<()> {
        info!("Starting daemon event loop");

        let (sway_tx, mut sway_rx) = mpsc::unbounded_channel();
        let sway_events = tokio::spawn(async move {
            if let Err(e) = monitor_sway_events(sway_tx).await {
                error!("Sway event monitoring error: {}", e);
            }
        });

        loop {
            tokio::select! {
                Some(key_event) = key_rx.recv() => {
                    self.handle_key_event(&key_event);
                }
                Some(request) = ipc_rx.recv() => {
                    let shutdown = request.command == IpcCommand::Shutdown;
                    let response = self.handle_ipc_command(&request.command);
                    if request.reply.send(response).is_err() {
                        debug!("IPC client went away before the reply");
                    }
                    if shutdown {
                        info!("Shutdown requested");
                        break;
                    }
                }
                Some(sway_event) = sway_rx.recv() => {
                    self.handle_sway_event(sway_event);
                }
                else => {
                    info!("All channels closed, shutting down");
                    break;
                }
            }
        }

        self.teardown();
        sway_events.abort();
        Ok(())
    }

    /// Session the next key event belongs to: the active one if any,
    /// otherwise the focused output's.
    fn target_scope(&mut self) -> Option<String> {
        if let Some((scope, _)) = self.sessions.iter().find(|(_, s)| s.is_active()) {
            return Some(scope.clone());
        }
        self.host.focused_output()
    }

    fn handle_key_event(&mut self, event: &KeyEvent) -> Option<IpcResponse> {
        debug!("Key event: {:?}", event);

        let scope = self.target_scope()?;
        let options = &self.options;
        let session = self
            .sessions
            .entry(scope.clone())
            .or_insert_with(|| SwitchSession::new(scope, options.clone()));

        match session.on_activation_key_event(&mut self.host, event) {
            Ok(_) => None,
            Err(e) => {
                info!("{}", e);
                Some(IpcResponse::Error(e.to_string()))
            }
        }
    }

    fn handle_ipc_command(&mut self, command: &IpcCommand) -> IpcResponse {
        if let Some(event) = command.key_event() {
            return self.handle_key_event(&event).unwrap_or(IpcResponse::Ok);
        }

        match command {
            IpcCommand::Status => self.status(),
            IpcCommand::Shutdown => IpcResponse::Ok,
            IpcCommand::Press(_) | IpcCommand::Release(_) => IpcResponse::Ok,
        }
    }

    fn status(&mut self) -> IpcResponse {
        let session = match self.target_scope() {
            Some(scope) => self.sessions.get(&scope),
            None => None,
        };
        match session {
            Some(session) if session.is_active() => IpcResponse::Status {
                active: true,
                window_count: session.windows().len(),
                selected: session.cursor(),
            },
            _ => IpcResponse::Status {
                active: false,
                window_count: 0,
                selected: None,
            },
        }
    }

    fn handle_sway_event(&mut self, event: SwayEvent) {
        match event {
            SwayEvent::Focus(window) => {
                self.host.on_focus(window);
            }
            SwayEvent::Closed(window) => {
                for session in self.sessions.values_mut() {
                    if session.on_window_removed(&mut self.host, window) == RemovalOutcome::Terminated {
                        info!("Switcher on {} closed with its last window", session.scope());
                    }
                }
                self.host.on_window_closed(window);
            }
            SwayEvent::Title(window, title) => {
                if self.host.on_title_changed(window, title) {
                    for session in self.sessions.values_mut() {
                        session.on_window_changed(&mut self.host, window);
                    }
                }
            }
            SwayEvent::WorkspaceFocused => {
                for scope in self.host.take_revoked_scopes() {
                    if let Some(session) = self.sessions.get_mut(&scope) {
                        session.on_ownership_revoked(&mut self.host);
                    }
                }
            }
        }
    }

    /// End every session, e.g. before the daemon exits.
    fn teardown(&mut self) {
        for session in self.sessions.values_mut() {
            session.on_plugin_teardown(&mut self.host);
        }
    }
}

impl<C: SwayClient> Drop for Daemon<C> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Monitor Sway events for window and workspace changes
async fn monitor_sway_events(sway_tx: mpsc::UnboundedSender<SwayEvent>) -> Result<()> {
    let subs = [EventType::Window, EventType::Workspace];
    let mut events = Connection::new().await?.subscribe(subs).await?;

    info!("Subscribed to Sway window and workspace events");

    while let Some(event) = events.next().await {
        let forwarded = match event? {
            Event::Window(e) => {
                debug!("Sway window event: {:?} for container {:?}", e.change, e.container.id);
                let window = WindowRef::new(e.container.id);
                match e.change {
                    WindowChange::Focus => Some(SwayEvent::Focus(window)),
                    WindowChange::Close => Some(SwayEvent::Closed(window)),
                    WindowChange::Title => {
                        let title = e.container.name.clone().unwrap_or_default();
                        Some(SwayEvent::Title(window, title))
                    }
                    _ => None,
                }
            }
            Event::Workspace(e) if matches!(e.change, WorkspaceChange::Focus) => Some(SwayEvent::WorkspaceFocused),
            _ => None,
        };

        if let Some(sway_event) = forwarded {
            if sway_tx.send(sway_event).is_err() {
                warn!("Daemon stopped listening for sway events");
                break;
            }
        }
    }

    Ok(())
}
