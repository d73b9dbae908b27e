use crate::ipc::{get_socket_path, IpcCommand, IpcResponse};
use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

/// Send a command to the daemon and get the response
pub fn send_command(command: &IpcCommand) -> Result<IpcResponse> {
    send_command_to(&get_socket_path()?, command)
}

fn send_command_to(socket_path: &Path, command: &IpcCommand) -> Result<IpcResponse> {
    let mut stream = UnixStream::connect(socket_path).with_context(|| {
        format!(
            "Failed to connect to daemon at {}. Is the daemon running?",
            socket_path.display()
        )
    })?;
    stream.set_read_timeout(Some(TIMEOUT))?;
    stream.set_write_timeout(Some(TIMEOUT))?;

    writeln!(stream, "{}", command)?;
    stream.flush()?;

    let mut response_line = String::new();
    BufReader::new(stream)
        .read_line(&mut response_line)
        .context("Daemon closed the connection without answering")?;

    serde_json::from_str(&response_line).context("Failed to parse daemon response")
}

/// Human-readable form of a successful response, if it carries anything.
fn describe(response: &IpcResponse) -> Option<String> {
    match response {
        IpcResponse::Status {
            active: true,
            window_count,
            selected,
        } => Some(match selected {
            Some(idx) => format!("active: window {} of {}", idx + 1, window_count),
            None => format!("active: {} windows", window_count),
        }),
        IpcResponse::Status { active: false, .. } => Some("inactive".to_string()),
        IpcResponse::Ok | IpcResponse::Error(_) => None,
    }
}

/// Send command and print result, exit with appropriate code
pub fn send_command_and_exit(command: IpcCommand) -> ! {
    match send_command(&command) {
        Ok(IpcResponse::Error(e)) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        Ok(response) => {
            if let Some(text) = describe(&response) {
                println!("{}", text);
            }
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::net::UnixListener;

    #[test]
    fn test_describe_status() {
        let active = IpcResponse::Status {
            active: true,
            window_count: 4,
            selected: Some(1),
        };
        assert_eq!(describe(&active).as_deref(), Some("active: window 2 of 4"));

        let inactive = IpcResponse::Status {
            active: false,
            window_count: 0,
            selected: None,
        };
        assert_eq!(describe(&inactive).as_deref(), Some("inactive"));
        assert_eq!(describe(&IpcResponse::Ok), None);
    }

    #[test]
    fn test_send_command_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daemon.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let mut stream = stream;
            writeln!(stream, "{{\"error\":\"busy\"}}").unwrap();
            line
        });

        let response = send_command_to(&path, &IpcCommand::Status).unwrap();
        assert_eq!(response, IpcResponse::Error("busy".to_string()));
        assert_eq!(server.join().unwrap(), "status\n");
    }

    #[test]
    fn test_send_command_without_daemon() {
        let dir = tempfile::tempdir().unwrap();
        let err = send_command_to(&dir.path().join("missing.sock"), &IpcCommand::Shutdown).unwrap_err();
        assert!(err.to_string().contains("Is the daemon running?"));
    }
}
