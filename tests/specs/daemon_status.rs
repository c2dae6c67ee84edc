use assert_cmd::Command;
use predicates::prelude::*;

/// A port unlikely to have anything listening, so `status`/`stop` observe a
/// consistently absent daemon regardless of the host running these tests.
const UNUSED_PORT: &str = "47190";

#[test]
fn status_reports_not_running_when_no_daemon_is_listening() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("devswarm")
        .unwrap()
        .env("DEVSWARM_PORT", UNUSED_PORT)
        .env("DEVSWARM_DATA_DIR", dir.path())
        .args(["daemon", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not running"));
}

#[test]
fn stop_is_a_no_op_when_no_daemon_is_running() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("devswarm")
        .unwrap()
        .env("DEVSWARM_PORT", UNUSED_PORT)
        .env("DEVSWARM_DATA_DIR", dir.path())
        .args(["daemon", "stop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not running"));
}

#[test]
fn logs_reports_missing_file_instead_of_erroring() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("devswarm")
        .unwrap()
        .env("DEVSWARM_DATA_DIR", dir.path())
        .args(["daemon", "logs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no log file found"));
}
