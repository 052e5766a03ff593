//! Scripted session for tests and dry runs.
//!
//! Replies are matched on the exact command string. Unmatched commands
//! succeed with empty output. Every issued command is recorded in a
//! [`SharedLog`] that stays readable after the session has been moved into a
//! bridge server.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use guestmount_shared::errors::BridgeResult;
use parking_lot::Mutex;

use super::{CapturedProcess, GuestSession};

/// Commands issued through a [`ScriptedSession`], in order.
#[derive(Debug, Clone, Default)]
pub struct SharedLog(Arc<Mutex<Vec<String>>>);

impl SharedLog {
    pub fn commands(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    /// Number of issued commands starting with `prefix`.
    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.0
            .lock()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn push(&self, command: &str) {
        self.0.lock().push(command.to_string());
    }
}

#[derive(Debug, Default)]
pub struct ScriptedSession {
    replies: HashMap<String, VecDeque<CapturedProcess>>,
    sticky: HashMap<String, CapturedProcess>,
    issued: SharedLog,
}

impl ScriptedSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to every `command` with `reply`.
    pub fn on(mut self, command: impl Into<String>, reply: CapturedProcess) -> Self {
        self.sticky.insert(command.into(), reply);
        self
    }

    /// Reply to the next `command` with `reply`; queued replies are used
    /// before any sticky one.
    pub fn once(mut self, command: impl Into<String>, reply: CapturedProcess) -> Self {
        self.replies.entry(command.into()).or_default().push_back(reply);
        self
    }

    /// Reply to `command` with a successful run printing `stdout`.
    pub fn respond(self, command: impl Into<String>, stdout: impl Into<String>) -> Self {
        self.on(command, CapturedProcess::success(stdout))
    }

    /// Make `command` exit with `exit_code` and print `stderr`.
    pub fn fail(
        self,
        command: impl Into<String>,
        exit_code: i32,
        stderr: impl Into<String>,
    ) -> Self {
        self.on(command, CapturedProcess::failure(exit_code, stderr))
    }

    /// Reply to the identity queries a mount issues.
    pub fn with_guest_identity(self, user: &str, group: &str, uid: u32, gid: u32) -> Self {
        self.respond("id -nu", format!("{}\n", user))
            .respond("id -ng", format!("{}\n", group))
            .respond("id -u", format!("{}\n", uid))
            .respond("id -g", format!("{}\n", gid))
    }

    /// Handle to the issued-command log.
    pub fn issued(&self) -> SharedLog {
        self.issued.clone()
    }
}

impl GuestSession for ScriptedSession {
    type Process = CapturedProcess;

    fn exec(&mut self, command: &str) -> BridgeResult<CapturedProcess> {
        self.issued.push(command);

        if let Some(reply) = self.replies.get_mut(command).and_then(VecDeque::pop_front) {
            return Ok(reply);
        }

        Ok(self
            .sticky
            .get(command)
            .cloned()
            .unwrap_or_else(|| CapturedProcess::success("")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::RemoteProcess;

    #[test]
    fn queued_replies_win_over_sticky_ones() {
        let mut session = ScriptedSession::new()
            .respond("id -u", "1000\n")
            .once("id -u", CapturedProcess::failure(1, "boom"));

        let mut first = session.exec("id -u").unwrap();
        assert_eq!(first.exit_code().unwrap(), 1);

        let mut second = session.exec("id -u").unwrap();
        assert_eq!(second.read_std_output().unwrap(), "1000\n");
    }

    #[test]
    fn issued_log_survives_moving_the_session() {
        let session = ScriptedSession::new();
        let log = session.issued();

        let mut moved = session;
        moved.exec("which sshfs").unwrap();
        moved.exec("id -u").unwrap();

        assert_eq!(log.commands(), vec!["which sshfs", "id -u"]);
        assert_eq!(log.count_prefix("id "), 1);
    }
}
