//! Preflight validation of the guest.

use guestmount_shared::errors::{BridgeError, BridgeResult};

use crate::command::{GuestCommands, run_cmd_with};
use crate::log::LogSink;
use crate::session::{GuestSession, RemoteProcess};

/// Ensure `helper` is installed on the guest.
///
/// A failed presence check is logged at warn level with the captured
/// diagnostic and reported as [`BridgeError::MissingDependency`].
pub fn check_dependency_present<S>(
    session: &mut S,
    commands: &GuestCommands,
    helper: &str,
    log: &dyn LogSink,
) -> BridgeResult<()>
where
    S: GuestSession + ?Sized,
{
    run_cmd_with(session, &commands.which(helper), |process, _| {
        let detail = process
            .read_std_error()
            .unwrap_or_else(|e| e.to_string())
            .trim_end()
            .to_string();
        log.warn(&format!(
            "Unable to determine if '{}' is installed: {}",
            helper, detail
        ));
        Err(BridgeError::MissingDependency {
            helper: helper.to_string(),
            detail,
        })
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::{LogLevel, MemorySink};
    use crate::session::ScriptedSession;

    #[test]
    fn present_helper_passes() {
        let mut session = ScriptedSession::new().respond("which sshfs", "/usr/bin/sshfs\n");
        let sink = MemorySink::new();

        check_dependency_present(&mut session, &GuestCommands::default(), "sshfs", &sink)
            .unwrap();
        assert!(sink.records().is_empty());
    }

    #[test]
    fn missing_helper_warns_and_is_distinguished() {
        let mut session = ScriptedSession::new().fail("which sshfs", 1, "no sshfs in PATH\n");
        let sink = MemorySink::new();

        let err =
            check_dependency_present(&mut session, &GuestCommands::default(), "sshfs", &sink)
                .unwrap_err();

        assert!(err.is_missing_dependency());
        let warnings = sink.at_level(LogLevel::Warn);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("'sshfs'"));
        assert!(warnings[0].message.contains("no sshfs in PATH"));
    }
}
