mod config;
mod daemon;
mod error;
mod host;
mod icon_resolver;
mod ipc;
mod keybinding;
mod keyboard_monitor;
mod ordering;
mod overlay;
mod socket_client;
mod socket_server;
mod sway_client;
mod ui;
mod ui_commands;
mod ui_handler;
mod window_manager;
mod window_switcher;

use anyhow::{Context, Result};
use config::{Command, Config, InputSource};
use daemon::Daemon;
use gtk4::prelude::*;
use ipc::IpcCommand;
use keyboard_monitor::KeyboardMonitor;
use std::fs;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Get the path to the pidfile
fn get_pidfile_path() -> Result<PathBuf> {
    // Try to use XDG_RUNTIME_DIR, fall back to ~/.cache
    let runtime_dir = dirs::runtime_dir()
        .or_else(dirs::cache_dir)
        .context("Could not determine runtime directory")?;

    Ok(runtime_dir.join("sway-switcher.pid"))
}

/// Check if another instance is already running
fn check_pidfile() -> Result<()> {
    let pidfile = get_pidfile_path()?;

    if pidfile.exists() {
        let pid_str = fs::read_to_string(&pidfile).context("Failed to read pidfile")?;
        let pid: u32 = pid_str.trim().parse().context("Invalid PID in pidfile")?;

        if process_exists(pid) {
            anyhow::bail!(
                "Another instance of sway-switcher is already running (PID: {}). \
                 If this is incorrect, remove the pidfile at: {}",
                pid,
                pidfile.display()
            );
        }

        info!("Removing stale pidfile (PID {} not found)", pid);
        if let Err(e) = fs::remove_file(&pidfile) {
            tracing::warn!("Failed to remove stale pidfile: {}", e);
        }
    }

    Ok(())
}

fn process_exists(pid: u32) -> bool {
    PathBuf::from(format!("/proc/{}", pid)).exists()
}

/// Create the pidfile
fn create_pidfile() -> Result<PidfileGuard> {
    let pidfile = get_pidfile_path()?;
    let pid = std::process::id();

    fs::write(&pidfile, pid.to_string()).context("Failed to write pidfile")?;

    info!("Created pidfile at {} with PID {}", pidfile.display(), pid);

    Ok(PidfileGuard { path: pidfile })
}

/// Guard that removes the pidfile when dropped
struct PidfileGuard {
    path: PathBuf,
}

impl Drop for PidfileGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            error!("Failed to remove pidfile: {}", e);
        } else {
            info!("Removed pidfile at {}", self.path.display());
        }
    }
}

/// Turn a client subcommand into the command sent over the socket.
fn client_command(command: Command) -> Result<Option<IpcCommand>> {
    let command = match command {
        Command::Daemon => return Ok(None),
        Command::Press { binding } => IpcCommand::Press(
            binding
                .parse()
                .with_context(|| format!("Invalid binding '{}'", binding))?,
        ),
        Command::Release { key } => IpcCommand::Release(key.to_uppercase()),
        Command::Status => IpcCommand::Status,
        Command::Shutdown => IpcCommand::Shutdown,
    };
    Ok(Some(command))
}

fn main() -> Result<()> {
    let config = Config::parse();

    if let Some(command) = client_command(config.command())? {
        socket_client::send_command_and_exit(command);
    }

    let log_level = if config.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Ignore SIGUSR1 signal to prevent crashes
    #[cfg(unix)]
    unsafe {
        use libc::{signal, SIGUSR1, SIG_IGN};
        signal(SIGUSR1, SIG_IGN);
    }

    info!("Starting sway-switcher daemon with GTK UI");
    info!("Activation binding: {}, input: {:?}", config.activate, config.input);

    check_pidfile()?;
    let _pidfile_guard = create_pidfile()?;

    if config.input == InputSource::Evdev {
        keyboard_monitor::check_permissions(config.device.as_deref())?;
    }

    gtk4::init()?;

    let app = gtk4::Application::builder()
        .application_id("com.github.sway-switcher")
        .build();

    app.connect_activate(move |app| {
        let (ui_cmd_tx, ui_cmd_rx) = mpsc::unbounded_channel();
        ui_handler::handle_ui_commands(app.clone(), ui_cmd_rx);

        let config = config.clone();
        std::thread::spawn(move || {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    error!("Failed to create Tokio runtime: {}", e);
                    return;
                }
            };

            rt.block_on(async move {
                match run_daemon(config, ui_cmd_tx).await {
                    Ok(()) => info!("Daemon exited normally"),
                    Err(e) => error!("Daemon error: {:#}", e),
                }
            });
            // Dropping the runtime closes the UI channel, which lets app.run() return
        });
    });

    // GTK would otherwise try to parse our own CLI arguments
    app.run_with_args::<&str>(&[]);

    Ok(())
}

/// Run the async daemon logic on the Tokio runtime
async fn run_daemon(config: Config, ui_cmd_tx: mpsc::UnboundedSender<ui_commands::UiCommand>) -> Result<()> {
    let (key_tx, key_rx) = mpsc::unbounded_channel();

    let (ipc_rx, _socket_guard) = socket_server::start_server().await?;

    // With --input=ipc nothing sends on key_tx, but it has to stay open
    // for as long as the daemon runs.
    let _idle_key_tx = match config.input {
        InputSource::Evdev => {
            let keyboard_monitor = KeyboardMonitor::new(config.device.as_deref())?;
            std::thread::spawn(move || {
                if let Err(e) = keyboard_monitor.monitor_blocking(key_tx) {
                    error!("Keyboard monitor error: {}", e);
                }
            });
            None
        }
        InputSource::Ipc => Some(key_tx),
    };

    let daemon = Daemon::new(config.switcher_options(), Some(ui_cmd_tx))?;
    daemon.run(key_rx, ipc_rx).await
}
