//! Remote command runner.
//!
//! Runs one command over a session, returns its standard output and
//! classifies non-zero exits through an error handler.

use std::borrow::Cow;

use guestmount_shared::errors::{BridgeError, BridgeResult};

use crate::session::{GuestSession, RemoteProcess};

/// Run `command`, failing with [`BridgeError::CommandFailed`] on a non-zero exit.
pub fn run_cmd<S>(session: &mut S, command: &str) -> BridgeResult<String>
where
    S: GuestSession + ?Sized,
{
    run_cmd_with(session, command, |process, exit_code| {
        Err(command_failed(command, exit_code, process))
    })
}

/// Run `command`, handing non-zero exits to `on_error`.
///
/// `on_error` sees the process (so it can read stderr) and the exit code.
/// Returning `Ok(())` continues and yields the captured stdout; returning an
/// error aborts with it.
pub fn run_cmd_with<S, F>(session: &mut S, command: &str, on_error: F) -> BridgeResult<String>
where
    S: GuestSession + ?Sized,
    F: FnOnce(&mut S::Process, i32) -> BridgeResult<()>,
{
    let mut process = session.exec(command)?;
    let exit_code = process.exit_code()?;
    if exit_code != 0 {
        on_error(&mut process, exit_code)?;
    }
    process.read_std_output()
}

/// Build a [`BridgeError::CommandFailed`] carrying the process's stderr.
pub fn command_failed<P>(command: &str, exit_code: i32, process: &mut P) -> BridgeError
where
    P: RemoteProcess + ?Sized,
{
    let stderr = process
        .read_std_error()
        .unwrap_or_else(|e| format!("<stderr unavailable: {}>", e));
    BridgeError::CommandFailed {
        command: command.to_string(),
        exit_code,
        stderr: stderr.trim_end().to_string(),
    }
}

/// Quote `arg` for a POSIX shell on the guest.
pub fn quote(arg: &str) -> Cow<'_, str> {
    shell_escape::unix::escape(Cow::Borrowed(arg))
}

/// Renders the command strings a mount issues on the guest.
#[derive(Debug, Clone)]
pub struct GuestCommands {
    privilege_prefix: Option<String>,
}

impl GuestCommands {
    pub fn new(privilege_prefix: Option<String>) -> Self {
        Self { privilege_prefix }
    }

    fn privileged(&self, command: String) -> String {
        match self.privilege_prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => format!("{} {}", prefix, command),
            _ => command,
        }
    }

    /// Presence check for the bridging helper.
    pub fn which(&self, helper: &str) -> String {
        format!("which {}", quote(helper))
    }

    /// Directory existence probe: exit 0 when `path` is a directory.
    pub fn test_dir(&self, path: &str) -> String {
        format!("test -d {}", quote(path))
    }

    pub fn mkdir(&self, path: &str) -> String {
        self.privileged(format!("mkdir -p {}", quote(path)))
    }

    pub fn chown(&self, user: &str, group: &str, path: &str) -> String {
        self.privileged(format!(
            "chown {}:{} {}",
            quote(user),
            quote(group),
            quote(path)
        ))
    }

    pub fn user_name(&self) -> &'static str {
        "id -nu"
    }

    pub fn group_name(&self) -> &'static str {
        "id -ng"
    }

    pub fn uid(&self) -> &'static str {
        "id -u"
    }

    pub fn gid(&self) -> &'static str {
        "id -g"
    }
}

impl Default for GuestCommands {
    fn default() -> Self {
        Self::new(Some(
            guestmount_shared::constants::DEFAULT_PRIVILEGE_PREFIX.to_string(),
        ))
    }
}
