//! Ownership reconciliation for directories created on the guest.

use guestmount_shared::errors::BridgeResult;

use crate::command::{GuestCommands, run_cmd};
use crate::session::GuestSession;
use crate::util::trim_end;

/// User and group names of the guest session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestOwner {
    pub user: String,
    pub group: String,
}

/// Query the guest session's user and group names.
pub fn query_owner<S>(session: &mut S, commands: &GuestCommands) -> BridgeResult<GuestOwner>
where
    S: GuestSession + ?Sized,
{
    let user = run_cmd(session, commands.user_name())?;
    let group = run_cmd(session, commands.group_name())?;
    Ok(GuestOwner {
        user: trim_end(&user).to_string(),
        group: trim_end(&group).to_string(),
    })
}

/// Give `path` to the guest session's user and group.
pub fn reconcile_owner<S>(session: &mut S, commands: &GuestCommands, path: &str) -> BridgeResult<()>
where
    S: GuestSession + ?Sized,
{
    let owner = query_owner(session, commands)?;
    run_cmd(session, &commands.chown(&owner.user, &owner.group, path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ScriptedSession;
    use guestmount_shared::errors::BridgeError;

    #[test]
    fn reconcile_trims_names_before_chown() {
        let mut session = ScriptedSession::new()
            .respond("id -nu", "ubuntu \n")
            .respond("id -ng", "staff\r\n");
        let log = session.issued();

        reconcile_owner(&mut session, &GuestCommands::default(), "/mnt/project").unwrap();

        assert_eq!(
            log.commands(),
            vec!["id -nu", "id -ng", "sudo chown ubuntu:staff /mnt/project"]
        );
    }

    #[test]
    fn every_call_queries_the_owner_again() {
        let commands = GuestCommands::default();
        let mut session = ScriptedSession::new().with_guest_identity("ubuntu", "ubuntu", 1000, 1000);
        let log = session.issued();

        reconcile_owner(&mut session, &commands, "/mnt").unwrap();
        reconcile_owner(&mut session, &commands, "/mnt/project").unwrap();

        assert_eq!(
            log.commands(),
            vec![
                "id -nu",
                "id -ng",
                "sudo chown ubuntu:ubuntu /mnt",
                "id -nu",
                "id -ng",
                "sudo chown ubuntu:ubuntu /mnt/project",
            ]
        );
    }

    #[test]
    fn chown_failure_propagates() {
        let mut session = ScriptedSession::new()
            .with_guest_identity("ubuntu", "ubuntu", 1000, 1000)
            .fail("sudo chown ubuntu:ubuntu /mnt", 1, "Operation not permitted");

        let err = reconcile_owner(&mut session, &GuestCommands::default(), "/mnt").unwrap_err();
        assert!(matches!(err, BridgeError::CommandFailed { .. }));
    }
}
