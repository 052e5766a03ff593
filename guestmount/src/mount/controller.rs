//! Mount setup sequence.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use guestmount_shared::errors::{BridgeError, BridgeResult};
use tokio::sync::oneshot;

use super::handle::GuestMount;
use super::types::{MountEndpoint, MountId};
use crate::identity::{IdentityMap, resolve_default_ids};
use crate::log::{LogSink, TracingSink};
use crate::materialize::materialize;
use crate::options::MountOptions;
use crate::preflight::check_dependency_present;
use crate::server::{BridgeServerFactory, BridgeSpec};
use crate::session::GuestSession;

/// Provisions mounts and launches their bridge workers.
///
/// Setup is fail-fast: the first failing step aborts `start()` and no worker
/// is left behind.
///
/// ```
/// use guestmount::session::ScriptedSession;
/// use guestmount::{IdentityMap, IdleServer, MountController, MountEndpoint, MountStatus};
///
/// let session = ScriptedSession::new().with_guest_identity("ubuntu", "ubuntu", 1000, 1000);
/// let controller = MountController::new(IdleServer::factory());
/// let endpoint = MountEndpoint::new("/home/user/project", "/mnt/project").unwrap();
///
/// let mount = controller.start(session, endpoint, IdentityMap::default()).unwrap();
/// mount.stop();
/// assert_eq!(mount.status(), MountStatus::Stopped);
/// ```
pub struct MountController<F> {
    factory: F,
    options: MountOptions,
    log: Arc<dyn LogSink>,
}

impl<F> MountController<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            options: MountOptions::default(),
            log: Arc::new(TracingSink),
        }
    }

    pub fn with_options(mut self, options: MountOptions) -> Self {
        self.options = options;
        self
    }

    /// Send diagnostics to `log` instead of `tracing`.
    pub fn with_log_sink(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = log;
        self
    }

    pub fn options(&self) -> &MountOptions {
        &self.options
    }

    /// Provision `endpoint` on the guest and start bridging it.
    ///
    /// Runs, in order and on the calling thread: helper preflight, target
    /// materialization with ownership fixes, default identity resolution and
    /// server construction. The session moves into the server; the server's
    /// serve loop then runs on a dedicated worker thread.
    pub fn start<S>(
        &self,
        mut session: S,
        endpoint: MountEndpoint,
        identity: IdentityMap,
    ) -> BridgeResult<GuestMount>
    where
        S: GuestSession,
        F: BridgeServerFactory<S>,
    {
        self.options.validate()?;

        let id = MountId::new();
        let log = self.log.as_ref();
        let commands = self.options.commands();
        log.debug(&format!(
            "start(id = {}, source = {}, target = {}, uid_map = {} entries, gid_map = {} entries)",
            id,
            endpoint.source().display(),
            endpoint.target(),
            identity.uid_map().len(),
            identity.gid_map().len()
        ));

        check_dependency_present(&mut session, &commands, &self.options.helper, log)?;

        let created_dirs = materialize(
            &mut session,
            endpoint.target(),
            &commands,
            self.options.existence_probe,
            log,
        )?;

        let default_identity = resolve_default_ids(&mut session, &commands, log)?;

        let (uid_map, gid_map) = identity.clone().into_maps();
        let server = self.factory.create(BridgeSpec {
            session,
            source: endpoint.source().to_path_buf(),
            target: endpoint.target().to_string(),
            gid_map,
            uid_map,
            default_uid: default_identity.uid,
            default_gid: default_identity.gid,
        })?;

        GuestMount::launch(
            id,
            endpoint,
            identity,
            default_identity,
            created_dirs,
            Arc::from(server),
            Arc::clone(&self.log),
            &self.options.thread_name_prefix,
        )
    }

    /// [`start`](Self::start) on its own thread, bounded by `deadline`.
    ///
    /// Remote commands carry no timeout of their own. When the deadline
    /// passes this returns [`BridgeError::Timeout`]. Setup keeps running on
    /// its detached thread and a mount it produces late is dropped, which
    /// stops it.
    pub async fn start_with_deadline<S>(
        self: &Arc<Self>,
        session: S,
        endpoint: MountEndpoint,
        identity: IdentityMap,
        deadline: Duration,
    ) -> BridgeResult<GuestMount>
    where
        S: GuestSession + 'static,
        F: BridgeServerFactory<S> + 'static,
    {
        let controller = Arc::clone(self);
        let (tx, rx) = oneshot::channel();
        thread::Builder::new()
            .name(format!("{}-setup", self.options.thread_name_prefix))
            .spawn(move || {
                let result = controller.start(session, endpoint, identity);
                // Receiver is gone once the deadline passed; the late mount drops here.
                let _ = tx.send(result);
            })
            .map_err(|e| {
                BridgeError::Internal(format!("failed to spawn mount setup thread: {}", e))
            })?;

        match tokio::time::timeout(deadline, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(BridgeError::Internal(
                "mount setup thread exited without a result".to_string(),
            )),
            Err(_) => {
                self.log.warn(&format!(
                    "mount setup did not finish within {:?}",
                    deadline
                ));
                Err(BridgeError::Timeout(format!(
                    "mount setup did not finish within {:?}",
                    deadline
                )))
            }
        }
    }
}
