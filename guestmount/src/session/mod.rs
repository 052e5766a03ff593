//! Remote shell session seam.
//!
//! The transport itself (connection setup, authentication, channel handling)
//! lives outside this crate. Orchestration only needs to run one command at a
//! time and read back its exit status and captured streams.

mod openssh;
mod scripted;

pub use openssh::OpenSshSession;
pub use scripted::{ScriptedSession, SharedLog};

use guestmount_shared::errors::BridgeResult;

/// A command started over a [`GuestSession`].
pub trait RemoteProcess {
    /// Exit status of the command, waiting for it to finish if needed.
    fn exit_code(&mut self) -> BridgeResult<i32>;

    /// Everything the command wrote to standard output.
    fn read_std_output(&mut self) -> BridgeResult<String>;

    /// Everything the command wrote to standard error.
    fn read_std_error(&mut self) -> BridgeResult<String>;
}

/// An exclusively-owned remote shell session.
///
/// `exec` takes `&mut self`, so a session can only ever run one command at a
/// time and cannot be shared between the controller and the bridge server.
pub trait GuestSession: Send {
    type Process: RemoteProcess;

    fn exec(&mut self, command: &str) -> BridgeResult<Self::Process>;
}

impl<S: GuestSession + ?Sized> GuestSession for &mut S {
    type Process = S::Process;

    fn exec(&mut self, command: &str) -> BridgeResult<Self::Process> {
        (**self).exec(command)
    }
}

/// A finished command whose output has already been captured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedProcess {
    exit_code: i32,
    stdout: String,
    stderr: String,
}

impl CapturedProcess {
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Successful command printing `stdout`.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self::new(0, stdout, "")
    }

    /// Failed command printing `stderr`.
    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self::new(exit_code, "", stderr)
    }
}

impl RemoteProcess for CapturedProcess {
    fn exit_code(&mut self) -> BridgeResult<i32> {
        Ok(self.exit_code)
    }

    fn read_std_output(&mut self) -> BridgeResult<String> {
        Ok(self.stdout.clone())
    }

    fn read_std_error(&mut self) -> BridgeResult<String> {
        Ok(self.stderr.clone())
    }
}
