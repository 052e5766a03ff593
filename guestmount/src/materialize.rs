//! Target path materialization on the guest.
//!
//! The target path is walked from its shallowest prefix to the full path.
//! The first missing prefix flips a `needs_create` flag; from then on every
//! deeper prefix is created without checking, because a missing ancestor
//! implies missing descendants. Each created prefix is handed to the guest
//! session's user and group right away, looked up afresh for every prefix.

use std::path::Path;

use guestmount_shared::errors::BridgeResult;
use serde::{Deserialize, Serialize};

use crate::command::{GuestCommands, command_failed, run_cmd, run_cmd_with};
use crate::log::LogSink;
use crate::ownership::reconcile_owner;
use crate::session::GuestSession;

/// Where prefix existence is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExistenceProbe {
    /// Ask the guest with `test -d`.
    #[default]
    Guest,
    /// Check the host's own filesystem view.
    ///
    /// Only correct when host and guest directory presence are correlated,
    /// e.g. the guest sees the same tree at the same paths. Saves one round
    /// trip per prefix.
    Host,
}

/// Split `path` into its cumulative prefixes.
///
/// Both `/` and `\` separate components and the output always uses `/`.
/// Empty components (repeated or trailing separators) are skipped, so
/// `"/a\\b//c/"` yields `["/a", "/a/b", "/a/b/c"]`. The root alone yields
/// nothing.
pub fn split_path(path: &str) -> Vec<String> {
    let normalized = path.replace('\\', "/");
    let absolute = normalized.starts_with('/');

    let mut prefixes = Vec::new();
    let mut current = String::with_capacity(normalized.len());
    for component in normalized.split('/').filter(|c| !c.is_empty()) {
        if absolute || !current.is_empty() {
            current.push('/');
        }
        current.push_str(component);
        prefixes.push(current.clone());
    }
    prefixes
}

/// Create every missing prefix of `target` and give it to the guest user.
///
/// Returns the prefixes that were created, shallowest first.
pub fn materialize<S>(
    session: &mut S,
    target: &str,
    commands: &GuestCommands,
    probe: ExistenceProbe,
    log: &dyn LogSink,
) -> BridgeResult<Vec<String>>
where
    S: GuestSession + ?Sized,
{
    walk_missing(session, target, commands, probe, |session, prefix| {
        log.debug(&format!("creating {} on the guest", prefix));
        run_cmd(session, &commands.mkdir(prefix))?;
        reconcile_owner(session, commands, prefix)
    })
}

/// Prefixes of `target` that [`materialize`] would create, without creating them.
pub fn plan<S>(
    session: &mut S,
    target: &str,
    commands: &GuestCommands,
    probe: ExistenceProbe,
) -> BridgeResult<Vec<String>>
where
    S: GuestSession + ?Sized,
{
    walk_missing(session, target, commands, probe, |_, _| Ok(()))
}

fn walk_missing<S, F>(
    session: &mut S,
    target: &str,
    commands: &GuestCommands,
    probe: ExistenceProbe,
    mut on_missing: F,
) -> BridgeResult<Vec<String>>
where
    S: GuestSession + ?Sized,
    F: FnMut(&mut S, &str) -> BridgeResult<()>,
{
    let mut created = Vec::new();
    let mut needs_create = false;

    for prefix in split_path(target) {
        if needs_create || !prefix_exists(session, commands, probe, &prefix)? {
            needs_create = true;
            on_missing(session, &prefix)?;
            created.push(prefix);
        }
    }

    Ok(created)
}

fn prefix_exists<S>(
    session: &mut S,
    commands: &GuestCommands,
    probe: ExistenceProbe,
    prefix: &str,
) -> BridgeResult<bool>
where
    S: GuestSession + ?Sized,
{
    match probe {
        ExistenceProbe::Host => Ok(Path::new(prefix).exists()),
        ExistenceProbe::Guest => {
            let command = commands.test_dir(prefix);
            let mut exists = true;
            // test(1) exits 1 for "no such directory"; anything else is a real failure.
            run_cmd_with(session, &command, |process, exit_code| {
                if exit_code == 1 {
                    exists = false;
                    Ok(())
                } else {
                    Err(command_failed(&command, exit_code, process))
                }
            })?;
            Ok(exists)
        }
    }
}
