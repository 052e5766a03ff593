//! guestmount library.
//!
//! Bridges a host directory into a virtual-machine guest over a remote shell
//! session: validates the guest, materializes the target path with the right
//! ownership, resolves the default identity and runs the filesystem-protocol
//! server on a dedicated worker thread.

use std::path::Path;
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

// Global guard for tracing-appender to keep the writer thread alive
static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

pub mod command;
pub mod confinement;
pub mod identity;
pub mod log;
pub mod materialize;
pub mod mount;
pub mod options;
pub mod ownership;
pub mod preflight;
pub mod server;
pub mod session;
pub mod util;

pub use guestmount_shared::errors::{BridgeError, BridgeResult};
pub use identity::{DefaultIdentity, IdMap, IdentityMap};
pub use log::{LogLevel, LogSink, MemorySink, TracingSink};
pub use materialize::ExistenceProbe;
pub use mount::{GuestMount, MountController, MountEndpoint, MountId, MountStatus};
pub use options::MountOptions;
pub use server::{BridgeServer, BridgeServerFactory, BridgeSpec, IdleServer, IdleServerFactory};
pub use session::{CapturedProcess, GuestSession, OpenSshSession, RemoteProcess};

/// Initialize tracing for guestmount, writing into `logs_dir`.
///
/// Logs are written to `<logs_dir>/guestmount.log` with daily rotation.
/// Uses the `RUST_LOG` environment variable for filtering (defaults to `info`).
/// Idempotent: subsequent calls return immediately once initialized.
pub fn init_logging_for(logs_dir: &Path) -> BridgeResult<()> {
    std::fs::create_dir_all(logs_dir).map_err(|e| {
        BridgeError::Storage(format!(
            "Failed to create logs directory {}: {}",
            logs_dir.display(),
            e
        ))
    })?;

    let _ = LOG_GUARD.get_or_init(|| {
        let file_appender = tracing_appender::rolling::daily(
            logs_dir,
            guestmount_shared::constants::LOG_FILE_NAME,
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("info"))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        // If global default subscriber is already set, this will return an error.
        // We ignore it to avoid interfering with host-configured tracing.
        util::register_to_tracing(non_blocking, env_filter);

        guard
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_creates_directory_and_is_idempotent() {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let logs_dir = temp_dir.path().join("logs");

        init_logging_for(&logs_dir).expect("first init");
        init_logging_for(&logs_dir).expect("second init");

        assert!(logs_dir.is_dir());
    }
}
