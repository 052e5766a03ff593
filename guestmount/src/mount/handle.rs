//! Live mount handle: owns the bridge worker thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use guestmount_shared::errors::{BridgeError, BridgeResult};
use parking_lot::{Mutex, RwLock};

use super::state::{MountState, MountStatus};
use super::types::{MountEndpoint, MountId};
use crate::identity::{DefaultIdentity, IdentityMap};
use crate::log::LogSink;
use crate::server::BridgeServer;

/// A provisioned mount whose bridge runs on a dedicated worker thread.
///
/// The worker is the only thread that calls into the server's serve loop.
/// [`stop`](GuestMount::stop) signals the server and joins the worker; it is
/// idempotent and also runs on drop.
pub struct GuestMount {
    id: MountId,
    endpoint: MountEndpoint,
    identity: IdentityMap,
    default_identity: DefaultIdentity,
    created_dirs: Vec<String>,
    server: Arc<dyn BridgeServer>,
    state: Arc<RwLock<MountState>>,
    // Set by the worker while it is inside `run`.
    serving: Arc<AtomicBool>,
    // Taken exactly once; holding the lock serializes concurrent stop() calls.
    worker: Mutex<Option<JoinHandle<()>>>,
    log: Arc<dyn LogSink>,
}

impl GuestMount {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn launch(
        id: MountId,
        endpoint: MountEndpoint,
        identity: IdentityMap,
        default_identity: DefaultIdentity,
        created_dirs: Vec<String>,
        server: Arc<dyn BridgeServer>,
        log: Arc<dyn LogSink>,
        thread_name_prefix: &str,
    ) -> BridgeResult<Self> {
        let state = Arc::new(RwLock::new(MountState::new()));
        let serving = Arc::new(AtomicBool::new(false));
        let worker = spawn_worker(
            &id,
            thread_name_prefix,
            Arc::clone(&server),
            Arc::clone(&state),
            Arc::clone(&serving),
            Arc::clone(&log),
        )?;

        Ok(Self {
            id,
            endpoint,
            identity,
            default_identity,
            created_dirs,
            server,
            state,
            serving,
            worker: Mutex::new(Some(worker)),
            log,
        })
    }

    pub fn id(&self) -> &MountId {
        &self.id
    }

    pub fn endpoint(&self) -> &MountEndpoint {
        &self.endpoint
    }

    pub fn identity_map(&self) -> &IdentityMap {
        &self.identity
    }

    pub fn default_identity(&self) -> DefaultIdentity {
        self.default_identity
    }

    /// Guest directories created while provisioning, shallowest first.
    pub fn created_dirs(&self) -> &[String] {
        &self.created_dirs
    }

    pub fn status(&self) -> MountStatus {
        self.state.read().status
    }

    pub fn state(&self) -> MountState {
        self.state.read().clone()
    }

    /// True while the worker is inside the serve loop. Never blocks.
    pub fn is_serving(&self) -> bool {
        self.serving.load(Ordering::Acquire)
    }

    /// Stop the bridge and join its worker.
    ///
    /// Never fails: a worker that panicked is logged, not propagated. Safe to
    /// call repeatedly, concurrently, or before the worker started serving.
    pub fn stop(&self) {
        let mut worker = self.worker.lock();

        // Stopped here means the serve loop already returned on its own;
        // only the join is left.
        let already_stopped = {
            let mut state = self.state.write();
            if state.status.can_transition_to(MountStatus::Stopping) {
                let _ = state.transition_to(MountStatus::Stopping);
            }
            state.status.is_stopped()
        };
        if already_stopped && worker.is_none() {
            return;
        }

        if !already_stopped {
            self.log.debug(&format!("stopping mount {}", self.id));
            self.server.stop();
        }

        if let Some(handle) = worker.take() {
            if handle.thread().id() == thread::current().id() {
                self.log.warn(&format!(
                    "mount {} stopped from its own worker; not joining",
                    self.id
                ));
            } else if handle.join().is_err() {
                self.log
                    .warn(&format!("bridge worker for mount {} panicked", self.id));
            }
        }

        if already_stopped {
            return;
        }
        if let Err(e) = self.state.write().transition_to(MountStatus::Stopped) {
            self.log.warn(&format!("mount {}: {}", self.id, e));
        }
        self.log.info(&format!("mount {} stopped", self.id));
    }
}

impl Drop for GuestMount {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for GuestMount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuestMount")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("status", &self.status())
            .finish()
    }
}

fn spawn_worker(
    id: &MountId,
    thread_name_prefix: &str,
    server: Arc<dyn BridgeServer>,
    state: Arc<RwLock<MountState>>,
    serving: Arc<AtomicBool>,
    log: Arc<dyn LogSink>,
) -> BridgeResult<JoinHandle<()>> {
    let mount_id = id.clone();
    thread::Builder::new()
        .name(format!("{}-{}", thread_name_prefix, id.short()))
        .spawn(move || {
            // A stop that lands before this point wins; the server is never run.
            if state.write().transition_to(MountStatus::Running).is_err() {
                log.debug(&format!(
                    "mount {} stopped before the bridge started serving",
                    mount_id
                ));
                return;
            }

            log.info(&format!("mount {} connected", mount_id));
            let outcome = {
                let _serving = ServingFlag::raise(serving);
                server.run()
            };
            if let Err(e) = outcome {
                log.warn(&format!(
                    "bridge server for mount {} exited with error: {}",
                    mount_id, e
                ));
            }

            // Without a stop request in flight the mount ends here.
            let mut state = state.write();
            if state.status.is_running() {
                let _ = state.transition_to(MountStatus::Stopped);
            }
            drop(state);
            log.info(&format!("mount {} stopped serving", mount_id));
        })
        .map_err(|e| BridgeError::Internal(format!("failed to spawn bridge worker: {}", e)))
}

/// Raised while the serve loop runs; lowered on return or unwind.
struct ServingFlag(Arc<AtomicBool>);

impl ServingFlag {
    fn raise(flag: Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for ServingFlag {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
