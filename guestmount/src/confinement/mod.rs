//! Process confinement for host-side helper processes.
//!
//! Helpers that accompany a mount (an ssh client, a local protocol server)
//! are started through a [`ConfinementSystem`] chosen by configuration.
//! Each strategy turns a [`ProcessSpec`] into a running [`Process`]; new
//! isolation policies are added as new [`ConfinementKind`] variants.
//!
//! ```ignore
//! let system = confinement::create_system(ConfinementKind::Unconfined);
//! let mut process = system.create_process(
//!     ProcessSpec::new("/usr/lib/openssh/sftp-server").arg("-e"),
//! )?;
//! process.wait()?;
//! ```

mod unconfined;

pub use unconfined::UnconfinedSystem;

use std::path::PathBuf;
use std::process::ExitStatus;

use guestmount_shared::errors::BridgeResult;
use serde::{Deserialize, Serialize};

/// What to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub working_dir: Option<PathBuf>,
}

impl ProcessSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            working_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

/// A started process.
pub trait Process: Send {
    fn pid(&self) -> u32;

    /// Block until the process exits.
    fn wait(&mut self) -> BridgeResult<ExitStatus>;

    /// Exit status if the process already exited.
    fn try_wait(&mut self) -> BridgeResult<Option<ExitStatus>>;

    fn kill(&mut self) -> BridgeResult<()>;
}

/// A process-creation strategy.
pub trait ConfinementSystem: Send + Sync {
    fn create_process(&self, spec: ProcessSpec) -> BridgeResult<Box<dyn Process>>;
}

/// Confinement strategies selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfinementKind {
    /// No sandboxing: the program runs with the caller's privileges.
    #[default]
    Unconfined,
}

/// Build the strategy for `kind`.
pub fn create_system(kind: ConfinementKind) -> Box<dyn ConfinementSystem> {
    match kind {
        ConfinementKind::Unconfined => Box::new(UnconfinedSystem::new()),
    }
}
