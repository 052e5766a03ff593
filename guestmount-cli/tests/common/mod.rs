use assert_cmd::Command;
use tempfile::TempDir;

/// A `guestmount` invocation with an isolated home directory.
pub struct TestContext {
    pub cmd: Command,
    pub home: TempDir,
}

impl TestContext {
    pub fn new_cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("guestmount").expect("guestmount binary");
        cmd.env("GUESTMOUNT_HOME", self.home.path());
        cmd
    }
}

pub fn guestmount() -> TestContext {
    let home = tempfile::tempdir().expect("create temp home");
    let mut cmd = Command::cargo_bin("guestmount").expect("guestmount binary");
    cmd.env("GUESTMOUNT_HOME", home.path());
    TestContext { cmd, home }
}
