//! Filesystem-protocol server seam.
//!
//! The server that answers guest read/write/stat requests is supplied by the
//! caller. This crate only builds it from a [`BridgeSpec`] and drives its
//! `run`/`stop` lifecycle.

use std::path::PathBuf;

use guestmount_shared::errors::BridgeResult;
use parking_lot::{Condvar, Mutex};

use crate::identity::{DefaultIdentity, IdMap};

/// Everything a bridge server is constructed from.
///
/// The session moves into the server and is used by it alone for the rest of
/// the mount's life.
#[derive(Debug)]
pub struct BridgeSpec<S> {
    pub session: S,
    pub source: PathBuf,
    pub target: String,
    pub gid_map: IdMap,
    pub uid_map: IdMap,
    pub default_uid: u32,
    pub default_gid: u32,
}

impl<S> BridgeSpec<S> {
    pub fn default_identity(&self) -> DefaultIdentity {
        DefaultIdentity {
            uid: self.default_uid,
            gid: self.default_gid,
        }
    }
}

/// A running filesystem bridge.
pub trait BridgeServer: Send + Sync {
    /// Serve requests until stopped. Blocks the calling thread.
    fn run(&self) -> BridgeResult<()>;

    /// Ask `run` to return.
    ///
    /// Must be callable from any thread, more than once, and before `run`
    /// has started; a stop that arrives first makes `run` return promptly.
    fn stop(&self);
}

/// Builds a [`BridgeServer`] for a session type.
pub trait BridgeServerFactory<S>: Send + Sync {
    fn create(&self, spec: BridgeSpec<S>) -> BridgeResult<Box<dyn BridgeServer>>;
}

impl<S, F> BridgeServerFactory<S> for F
where
    F: Fn(BridgeSpec<S>) -> BridgeResult<Box<dyn BridgeServer>> + Send + Sync,
{
    fn create(&self, spec: BridgeSpec<S>) -> BridgeResult<Box<dyn BridgeServer>> {
        self(spec)
    }
}

/// Server that serves nothing and returns from `run` once stopped.
///
/// Stands in for a real bridge in dry runs and tests.
#[derive(Debug, Default)]
pub struct IdleServer {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl IdleServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory that drops the session and yields an [`IdleServer`].
    pub fn factory() -> IdleServerFactory {
        IdleServerFactory
    }

    pub fn is_stopped(&self) -> bool {
        *self.stopped.lock()
    }
}

impl BridgeServer for IdleServer {
    fn run(&self) -> BridgeResult<()> {
        let mut stopped = self.stopped.lock();
        while !*stopped {
            self.wake.wait(&mut stopped);
        }
        Ok(())
    }

    fn stop(&self) {
        *self.stopped.lock() = true;
        self.wake.notify_all();
    }
}

/// Builds [`IdleServer`]s for any session type.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleServerFactory;

impl<S> BridgeServerFactory<S> for IdleServerFactory {
    fn create(&self, _spec: BridgeSpec<S>) -> BridgeResult<Box<dyn BridgeServer>> {
        Ok(Box::new(IdleServer::new()))
    }
}
