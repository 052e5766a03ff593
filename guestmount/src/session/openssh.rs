//! Session backed by the system OpenSSH client.
//!
//! Every `exec` runs `ssh <destination> <command>` in batch mode and captures
//! its output. Connection multiplexing, if wanted, is configured through the
//! user's ssh config (`ControlMaster`).

use std::path::PathBuf;
use std::process::Command;

use guestmount_shared::errors::{BridgeError, BridgeResult};

use super::{CapturedProcess, GuestSession};

/// ssh reserves this exit status for its own connection failures.
const SSH_CONNECTION_ERROR: i32 = 255;

#[derive(Debug, Clone)]
pub struct OpenSshSession {
    destination: String,
    port: Option<u16>,
    identity_file: Option<PathBuf>,
    connect_timeout_secs: u32,
    ssh_binary: PathBuf,
}

impl OpenSshSession {
    /// Create a session for `destination` (`user@host` or a config alias).
    pub fn new(destination: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            port: None,
            identity_file: None,
            connect_timeout_secs: 10,
            ssh_binary: PathBuf::from("ssh"),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_identity_file(mut self, identity_file: impl Into<PathBuf>) -> Self {
        self.identity_file = Some(identity_file.into());
        self
    }

    pub fn with_connect_timeout(mut self, secs: u32) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    /// Use a different ssh client binary.
    pub fn with_ssh_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.ssh_binary = binary.into();
        self
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Arguments passed to the ssh client before the remote command.
    pub fn ssh_args(&self) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout_secs),
        ];
        if let Some(port) = self.port {
            args.push("-p".to_string());
            args.push(port.to_string());
        }
        if let Some(ref identity) = self.identity_file {
            args.push("-i".to_string());
            args.push(identity.to_string_lossy().into_owned());
        }
        // Ends option parsing, so a destination starting with '-' stays a host.
        args.push("--".to_string());
        args.push(self.destination.clone());
        args
    }
}

impl GuestSession for OpenSshSession {
    type Process = CapturedProcess;

    fn exec(&mut self, command: &str) -> BridgeResult<CapturedProcess> {
        let output = Command::new(&self.ssh_binary)
            .args(self.ssh_args())
            .arg(command)
            .output()
            .map_err(|e| {
                BridgeError::Session(format!(
                    "failed to run {}: {}",
                    self.ssh_binary.display(),
                    e
                ))
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let exit_code = output.status.code().ok_or_else(|| {
            BridgeError::Session(format!(
                "ssh to {} was terminated by a signal",
                self.destination
            ))
        })?;

        if exit_code == SSH_CONNECTION_ERROR {
            return Err(BridgeError::Session(format!(
                "ssh to {} failed: {}",
                self.destination,
                stderr.trim_end()
            )));
        }

        Ok(CapturedProcess::new(
            exit_code,
            String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ssh_args_include_batch_mode_and_destination_last() {
        let session = OpenSshSession::new("ubuntu@10.0.0.5")
            .with_port(2222)
            .with_identity_file("/tmp/id_ed25519")
            .with_connect_timeout(3);

        let args = session.ssh_args();
        assert_eq!(&args[..4], ["-o", "BatchMode=yes", "-o", "ConnectTimeout=3"]);
        assert!(args.windows(2).any(|w| w == ["-p", "2222"]));
        assert!(args.windows(2).any(|w| w == ["-i", "/tmp/id_ed25519"]));
        assert_eq!(args.last().map(String::as_str), Some("ubuntu@10.0.0.5"));
    }

    #[test]
    fn destination_cannot_smuggle_ssh_options() {
        let session = OpenSshSession::new("-oProxyCommand=touch /tmp/pwned");
        let args = session.ssh_args();

        let n = args.len();
        assert_eq!(args[n - 2], "--");
        assert_eq!(args[n - 1], "-oProxyCommand=touch /tmp/pwned");
        assert!(!args[..n - 2].iter().any(|a| a.starts_with("-oProxyCommand")));
    }

    #[test]
    fn missing_client_binary_is_a_session_error() {
        let mut session =
            OpenSshSession::new("guest").with_ssh_binary("/nonexistent/guestmount-ssh");
        let err = session.exec("true").unwrap_err();
        assert!(matches!(err, BridgeError::Session(_)));
    }
}
