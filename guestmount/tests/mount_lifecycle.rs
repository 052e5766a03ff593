//! Integration tests for mount provisioning and lifecycle (start, stop, drop).

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use guestmount::log::LogLevel;
use guestmount::session::ScriptedSession;
use guestmount::{
    BridgeError, BridgeResult, BridgeServer, BridgeSpec, CapturedProcess, ExistenceProbe,
    GuestSession, IdMap, IdentityMap, IdleServer, MemorySink, MountController, MountEndpoint,
    MountOptions, MountStatus,
};

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn guest() -> ScriptedSession {
    ScriptedSession::new()
        .respond("which sshfs", "/usr/bin/sshfs\n")
        .with_guest_identity("ubuntu", "ubuntu", 1000, 1000)
}

fn host_probe_options() -> MountOptions {
    MountOptions {
        existence_probe: ExistenceProbe::Host,
        ..Default::default()
    }
}

/// Commands a host-probed mount of `target` is expected to issue.
fn expected_host_probe_commands(target: &str) -> Vec<String> {
    let mut expected = vec!["which sshfs".to_string()];
    let mut needs_create = false;
    for prefix in guestmount::materialize::split_path(target) {
        if needs_create || !Path::new(&prefix).exists() {
            needs_create = true;
            expected.push(format!("sudo mkdir -p {}", prefix));
            expected.push("id -nu".into());
            expected.push("id -ng".into());
            expected.push(format!("sudo chown ubuntu:ubuntu {}", prefix));
        }
    }
    expected.push("id -u".into());
    expected.push("id -g".into());
    expected
}

// ============================================================================
// END-TO-END
// ============================================================================

#[test]
fn start_provisions_then_stop_leaves_mount_stopped() {
    let session = guest();
    let issued = session.issued();
    let controller = MountController::new(IdleServer::factory()).with_options(host_probe_options());
    let endpoint = MountEndpoint::new("/home/user/project", "/mnt/project").unwrap();

    let mount = controller
        .start(session, endpoint, IdentityMap::default())
        .unwrap();

    assert_eq!(issued.commands(), expected_host_probe_commands("/mnt/project"));
    assert_eq!(issued.count_prefix("which "), 1);
    assert_eq!(issued.count_prefix("id -u"), 1);
    assert_eq!(issued.count_prefix("id -g"), 1);
    assert_eq!(
        issued.count_prefix("sudo mkdir -p"),
        issued.count_prefix("sudo chown")
    );
    assert_eq!(
        issued.count_prefix("sudo mkdir -p"),
        issued.count_prefix("id -nu")
    );
    assert_eq!(mount.default_identity().uid, 1000);
    assert_eq!(mount.endpoint().target(), "/mnt/project");

    mount.stop();
    assert_eq!(mount.status(), MountStatus::Stopped);
}

#[test]
fn every_missing_ancestor_is_created_and_chowned() {
    let session = guest()
        .fail("test -d /srv", 1, "")
        .fail("test -d /srv/share", 1, "");
    let issued = session.issued();
    let controller = MountController::new(IdleServer::factory());
    let endpoint = MountEndpoint::new("/home/user/project", "/srv/share/project").unwrap();

    let mount = controller
        .start(session, endpoint, IdentityMap::default())
        .unwrap();

    assert_eq!(
        mount.created_dirs(),
        ["/srv", "/srv/share", "/srv/share/project"]
    );
    for dir in mount.created_dirs() {
        assert!(issued.commands().contains(&format!("sudo mkdir -p {}", dir)));
        assert!(
            issued
                .commands()
                .contains(&format!("sudo chown ubuntu:ubuntu {}", dir))
        );
    }
    // The first missing prefix ends probing.
    assert_eq!(issued.count_prefix("test -d"), 1);
}

#[test]
fn missing_helper_fails_with_single_command() {
    let session = ScriptedSession::new().fail("which sshfs", 1, "which: no sshfs");
    let issued = session.issued();
    let sink = Arc::new(MemorySink::new());
    let controller = MountController::new(IdleServer::factory()).with_log_sink(sink.clone());
    let endpoint = MountEndpoint::new("/home/user/project", "/mnt/project").unwrap();

    let err = controller
        .start(session, endpoint, IdentityMap::default())
        .unwrap_err();

    assert!(matches!(err, BridgeError::MissingDependency { .. }));
    assert_eq!(issued.len(), 1);
    assert_eq!(sink.at_level(LogLevel::Warn).len(), 1);
}

#[test]
fn stop_is_idempotent_and_drop_is_safe() {
    let controller = MountController::new(IdleServer::factory()).with_options(host_probe_options());
    let endpoint = MountEndpoint::new("/home/user/project", "/mnt/project").unwrap();

    let mount = controller
        .start(guest(), endpoint, IdentityMap::default())
        .unwrap();

    mount.stop();
    mount.stop();
    assert_eq!(mount.status(), MountStatus::Stopped);
    drop(mount);
}

#[test]
fn identity_maps_reach_the_server_unchanged() {
    let captured: Arc<parking_lot::Mutex<Option<(IdMap, IdMap)>>> = Default::default();
    let slot = Arc::clone(&captured);
    let controller = MountController::new(
        move |spec: BridgeSpec<ScriptedSession>| -> BridgeResult<Box<dyn BridgeServer>> {
            *slot.lock() = Some((spec.uid_map, spec.gid_map));
            Ok(Box::new(IdleServer::new()))
        },
    )
    .with_options(host_probe_options());

    let uid_map = IdMap::from([(1000, 501), (0, 0)]);
    let gid_map = IdMap::from([(1000, 20)]);
    let mount = controller
        .start(
            guest(),
            MountEndpoint::new("/home/user/project", "/mnt/project").unwrap(),
            IdentityMap::new(uid_map.clone(), gid_map.clone()),
        )
        .unwrap();
    drop(mount);

    assert_eq!(captured.lock().take(), Some((uid_map, gid_map)));
}

// ============================================================================
// DEADLINE
// ============================================================================

/// Session whose every command takes `delay`.
struct SlowSession {
    inner: ScriptedSession,
    delay: Duration,
}

impl GuestSession for SlowSession {
    type Process = CapturedProcess;

    fn exec(&mut self, command: &str) -> BridgeResult<CapturedProcess> {
        std::thread::sleep(self.delay);
        self.inner.exec(command)
    }
}

#[tokio::test]
async fn slow_guest_hits_the_deadline() {
    let controller = Arc::new(MountController::new(IdleServer::factory()));
    let session = SlowSession {
        inner: guest(),
        delay: Duration::from_millis(100),
    };

    let err = controller
        .start_with_deadline(
            session,
            MountEndpoint::new("/home/user/project", "/mnt/project").unwrap(),
            IdentityMap::default(),
            Duration::from_millis(20),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, BridgeError::Timeout(_)));
}

#[test]
fn runtime_shutdown_does_not_wait_for_a_stuck_setup() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_time()
        .build()
        .unwrap();
    let controller = Arc::new(MountController::new(IdleServer::factory()));
    let session = SlowSession {
        inner: guest(),
        delay: Duration::from_secs(3),
    };

    let err = runtime
        .block_on(controller.start_with_deadline(
            session,
            MountEndpoint::new("/home/user/project", "/mnt/project").unwrap(),
            IdentityMap::default(),
            Duration::from_millis(50),
        ))
        .unwrap_err();
    assert!(matches!(err, BridgeError::Timeout(_)));

    let shutdown = Instant::now();
    drop(runtime);
    assert!(
        shutdown.elapsed() < Duration::from_secs(1),
        "runtime shutdown took {:?}",
        shutdown.elapsed()
    );
}

/// Serves through a shared [`IdleServer`] so the test can watch it.
struct SharedIdle(Arc<IdleServer>);

impl BridgeServer for SharedIdle {
    fn run(&self) -> BridgeResult<()> {
        self.0.run()
    }

    fn stop(&self) {
        self.0.stop()
    }
}

#[tokio::test]
async fn mount_finishing_after_the_deadline_is_stopped() {
    let server = Arc::new(IdleServer::new());
    let built = Arc::clone(&server);
    let controller = Arc::new(MountController::new(
        move |_spec: BridgeSpec<SlowSession>| -> BridgeResult<Box<dyn BridgeServer>> {
            Ok(Box::new(SharedIdle(Arc::clone(&built))))
        },
    ));
    let session = SlowSession {
        inner: guest(),
        delay: Duration::from_millis(30),
    };

    let err = controller
        .start_with_deadline(
            session,
            MountEndpoint::new("/home/user/project", "/mnt/project").unwrap(),
            IdentityMap::default(),
            Duration::from_millis(10),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Timeout(_)));

    let deadline = Instant::now() + Duration::from_secs(5);
    while !server.is_stopped() {
        assert!(Instant::now() < deadline, "late mount was never stopped");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
