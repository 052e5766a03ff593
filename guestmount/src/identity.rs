//! Host/guest identity mapping and default identity resolution.

use std::collections::HashMap;

use guestmount_shared::errors::{BridgeError, BridgeResult};

use crate::command::{GuestCommands, run_cmd};
use crate::log::LogSink;
use crate::session::GuestSession;

/// Guest numeric id → host numeric id.
pub type IdMap = HashMap<u32, u32>;

/// User and group translation tables for one mount.
///
/// Supplied by the caller and never modified while the mount is live.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityMap {
    uid_map: IdMap,
    gid_map: IdMap,
}

impl IdentityMap {
    pub fn new(uid_map: IdMap, gid_map: IdMap) -> Self {
        Self { uid_map, gid_map }
    }

    pub fn uid_map(&self) -> &IdMap {
        &self.uid_map
    }

    pub fn gid_map(&self) -> &IdMap {
        &self.gid_map
    }

    pub fn is_empty(&self) -> bool {
        self.uid_map.is_empty() && self.gid_map.is_empty()
    }

    /// Host uid for `guest_uid`, falling back to the default identity.
    pub fn host_uid(&self, guest_uid: u32, default: DefaultIdentity) -> u32 {
        self.uid_map.get(&guest_uid).copied().unwrap_or(default.uid)
    }

    /// Host gid for `guest_gid`, falling back to the default identity.
    pub fn host_gid(&self, guest_gid: u32, default: DefaultIdentity) -> u32 {
        self.gid_map.get(&guest_gid).copied().unwrap_or(default.gid)
    }

    /// Guest uid that maps to `host_uid`, if any.
    pub fn guest_uid(&self, host_uid: u32) -> Option<u32> {
        self.uid_map
            .iter()
            .find_map(|(guest, host)| (*host == host_uid).then_some(*guest))
    }

    /// Guest gid that maps to `host_gid`, if any.
    pub fn guest_gid(&self, host_gid: u32) -> Option<u32> {
        self.gid_map
            .iter()
            .find_map(|(guest, host)| (*host == host_gid).then_some(*guest))
    }

    pub(crate) fn into_maps(self) -> (IdMap, IdMap) {
        (self.uid_map, self.gid_map)
    }
}

/// Effective uid/gid of the guest session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DefaultIdentity {
    pub uid: u32,
    pub gid: u32,
}

/// Resolve the guest session's numeric uid and gid.
pub fn resolve_default_ids<S>(
    session: &mut S,
    commands: &GuestCommands,
    log: &dyn LogSink,
) -> BridgeResult<DefaultIdentity>
where
    S: GuestSession + ?Sized,
{
    let uid = query_id(session, commands.uid(), log)?;
    let gid = query_id(session, commands.gid(), log)?;
    Ok(DefaultIdentity { uid, gid })
}

fn query_id<S>(session: &mut S, query: &str, log: &dyn LogSink) -> BridgeResult<u32>
where
    S: GuestSession + ?Sized,
{
    let output = run_cmd(session, query)?;
    log.debug(&format!("`{}` = {}", query, output.trim_end()));
    parse_id(query, &output)
}

fn parse_id(query: &str, output: &str) -> BridgeResult<u32> {
    output
        .trim()
        .parse::<u32>()
        .map_err(|_| BridgeError::IdentityResolution {
            query: query.to_string(),
            output: output.to_string(),
        })
}
