//! Constants shared across guestmount crates.

/// Log category attached to every mount orchestration line.
pub const LOG_CATEGORY: &str = "guestmount::mount";

/// Helper binary that must be present on the guest for the bridge to work.
pub const DEFAULT_HELPER: &str = "sshfs";

/// Command prefix used for commands that need elevated privileges on the guest.
pub const DEFAULT_PRIVILEGE_PREFIX: &str = "sudo";

/// Name prefix for bridge worker threads.
pub const DEFAULT_THREAD_NAME_PREFIX: &str = "guestmount";

/// Log file name written under the logs directory.
pub const LOG_FILE_NAME: &str = "guestmount.log";

pub mod env {
    /// Home directory override for logs and configuration.
    pub const HOME: &str = "GUESTMOUNT_HOME";
}
