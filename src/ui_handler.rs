use crate::config::SwitcherStyle;
use crate::ui::{self, SwitcherWindow};
use crate::ui_commands::{OverlayId, UiCommand};
use gtk4::prelude::*;
use gtk4::Application;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Handles UI commands and dispatches them to the overlay windows
pub fn handle_ui_commands(app: Application, mut ui_rx: mpsc::UnboundedReceiver<UiCommand>) {
    info!("UI command handler started");

    let provider = ui::install_css_provider();
    let mut overlays: HashMap<OverlayId, SwitcherWindow> = HashMap::new();
    let mut applied_style: Option<SwitcherStyle> = None;

    // Use glib to handle commands on the GTK main thread
    glib::spawn_future_local(async move {
        // Overlays are created lazily, so keep the application running
        // while the daemon can still send commands.
        let _hold = app.hold();

        while let Some(command) = ui_rx.recv().await {
            match command {
                UiCommand::CreateOverlay { id, output } => {
                    debug!("Creating overlay {:?} on {}", id, output);
                    overlays.insert(id, SwitcherWindow::new(&app, &output));
                }
                UiCommand::Redraw { id, frame } => {
                    if applied_style.as_ref() != Some(&frame.style) {
                        if let Some(provider) = &provider {
                            ui::apply_style(provider, &frame.style);
                        }
                        applied_style = Some(frame.style.clone());
                    }
                    match overlays.get(&id) {
                        Some(window) => window.redraw(&frame),
                        None => warn!("Redraw for unknown overlay {:?}", id),
                    }
                }
                UiCommand::DestroyOverlay { id } => {
                    if let Some(window) = overlays.remove(&id) {
                        debug!("Destroying overlay {:?}", id);
                        window.destroy();
                    }
                }
            }
        }

        for (_, window) in overlays.drain() {
            window.destroy();
        }
        error!("UI command handler stopped - channel closed!");
    });
}
