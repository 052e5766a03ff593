//! Mount lifecycle status and state machine.

use guestmount_shared::errors::{BridgeError, BridgeResult};
use std::time::Instant;

/// Lifecycle status of a mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MountStatus {
    /// Setup done, worker spawned but not serving yet.
    Constructing,

    /// Worker is inside the server's serve loop.
    Running,

    /// Stop requested, waiting for the worker to exit.
    Stopping,

    /// Worker joined, never served, or its serve loop returned on its own.
    /// Terminal.
    Stopped,
}

impl MountStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, MountStatus::Running)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, MountStatus::Stopped)
    }

    /// Check if transition to target state is valid.
    pub fn can_transition_to(&self, target: MountStatus) -> bool {
        use MountStatus::*;
        matches!(
            (self, target),
            // Worker starts serving, or stop arrives before it does
            (Constructing, Running) |
            (Constructing, Stopping) |
            (Running, Stopping) |
            // Serve loop exited without a stop request
            (Running, Stopped) |
            (Stopping, Stopped)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MountStatus::Constructing => "constructing",
            MountStatus::Running => "running",
            MountStatus::Stopping => "stopping",
            MountStatus::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for MountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Current status plus when it last changed.
#[derive(Debug, Clone)]
pub struct MountState {
    pub status: MountStatus,
    pub last_updated: Instant,
}

impl MountState {
    pub fn new() -> Self {
        Self {
            status: MountStatus::Constructing,
            last_updated: Instant::now(),
        }
    }

    /// Attempt state transition with validation.
    pub fn transition_to(&mut self, new_status: MountStatus) -> BridgeResult<()> {
        if !self.status.can_transition_to(new_status) {
            return Err(BridgeError::Internal(format!(
                "Cannot transition mount from {} to {}",
                self.status, new_status
            )));
        }

        self.status = new_status;
        self.last_updated = Instant::now();
        Ok(())
    }
}

impl Default for MountState {
    fn default() -> Self {
        Self::new()
    }
}
