//! Strategy that applies no sandboxing.

use std::process::{Child, Command, ExitStatus};

use guestmount_shared::errors::{BridgeError, BridgeResult};

use super::{ConfinementSystem, Process, ProcessSpec};

#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfinedSystem;

impl UnconfinedSystem {
    pub fn new() -> Self {
        Self
    }
}

impl ConfinementSystem for UnconfinedSystem {
    fn create_process(&self, spec: ProcessSpec) -> BridgeResult<Box<dyn Process>> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        cmd.envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        if let Some(ref dir) = spec.working_dir {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|e| {
            BridgeError::Process(format!(
                "Failed to spawn {}: {}",
                spec.program.display(),
                e
            ))
        })?;

        tracing::debug!(
            program = %spec.program.display(),
            pid = child.id(),
            "Spawned unconfined process"
        );

        Ok(Box::new(UnconfinedProcess { child }))
    }
}

struct UnconfinedProcess {
    child: Child,
}

impl Process for UnconfinedProcess {
    fn pid(&self) -> u32 {
        self.child.id()
    }

    fn wait(&mut self) -> BridgeResult<ExitStatus> {
        self.child
            .wait()
            .map_err(|e| BridgeError::Process(format!("wait for {} failed: {}", self.pid(), e)))
    }

    fn try_wait(&mut self) -> BridgeResult<Option<ExitStatus>> {
        self.child
            .try_wait()
            .map_err(|e| BridgeError::Process(format!("poll of {} failed: {}", self.pid(), e)))
    }

    fn kill(&mut self) -> BridgeResult<()> {
        self.child
            .kill()
            .map_err(|e| BridgeError::Process(format!("kill of {} failed: {}", self.pid(), e)))
    }
}
