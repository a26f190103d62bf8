//! Basic CLI E2E tests.
//!
//! Tests run the built binary against a throwaway data directory and
//! verify outputs.

use std::path::Path;
use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_eyecare"))
        .arg("--data-dir")
        .arg(data_dir)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

/// Hold the data directory the way a running reminder loop does.
#[cfg(unix)]
fn hold_owner_lock(data_dir: &Path) -> std::fs::File {
    use std::os::unix::io::AsRawFd;
    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(data_dir.join("eyecare.lock"))
        .unwrap();
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    assert_eq!(rc, 0);
    file
}

fn run_json(data_dir: &Path, args: &[&str]) -> serde_json::Value {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("stdout is JSON")
}

#[test]
fn test_status_starts_idle() {
    let dir = tempfile::tempdir().unwrap();
    let status = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(status["state"], "idle");
    assert_eq!(status["phase"], "work");
    assert_eq!(status["remainingSecs"], 1200);
    assert_eq!(status["display"], "20:00");
    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn test_session_survives_between_invocations() {
    let dir = tempfile::tempdir().unwrap();
    let started = run_json(dir.path(), &["timer", "start"]);
    assert_eq!(started["state"], "work_running");

    let paused = run_json(dir.path(), &["timer", "pause"]);
    assert_eq!(paused["state"], "work_paused");

    let status = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(status["state"], "work_paused");
    assert_eq!(status["remainingSecs"], paused["remainingSecs"]);

    let reset = run_json(dir.path(), &["timer", "reset"]);
    assert_eq!(reset["state"], "idle");
}

#[test]
fn test_skip_outside_break_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let status = run_json(dir.path(), &["timer", "skip"]);
    assert_eq!(status["state"], "idle");
    assert_eq!(status["stats"]["totalCount"], 0);
}

#[test]
fn test_config_set_and_get() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "set", "breakDurationSeconds", "30"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "ok");

    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "breakDurationSeconds"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "30");

    let settings = run_json(dir.path(), &["config", "list"]);
    assert_eq!(settings["breakDurationSeconds"], 30);
    assert_eq!(settings["workDurationSeconds"], 1200);
}

#[test]
fn test_config_rejects_out_of_range() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "workDurationSeconds", "10"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_config_set_refused_while_running() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["timer", "start"]);
    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "breakDurationSeconds", "30"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("idle"));
}

#[test]
fn test_unknown_config_key() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "get", "theme"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Unknown configuration key"));
}

#[test]
fn test_stats_start_at_zero() {
    let dir = tempfile::tempdir().unwrap();
    let today = run_json(dir.path(), &["stats", "today"]);
    assert_eq!(today["todayCount"], 0);

    let all = run_json(dir.path(), &["stats", "all"]);
    assert_eq!(all["totalCount"], 0);
    assert_eq!(all["totalBreakMinutes"], 0);

    let reset = run_json(dir.path(), &["stats", "reset"]);
    assert_eq!(reset["totalCount"], 0);
}

#[cfg(unix)]
#[test]
fn test_owned_data_dir_refuses_changes() {
    let dir = tempfile::tempdir().unwrap();
    run_json(dir.path(), &["timer", "start"]);
    let lock = hold_owner_lock(dir.path());

    let refused: [&[&str]; 4] = [
        &["timer", "reset"],
        &["stats", "reset"],
        &["config", "set", "breakDurationSeconds", "30"],
        &["run", "--no-autostart"],
    ];
    for args in refused {
        let (_, stderr, code) = run_cli(dir.path(), args);
        assert_eq!(code, 1, "{args:?} should be refused");
        assert!(stderr.contains("owned by another eyecare process"), "{stderr}");
    }

    // Reads still work and see the owner's session.
    let status = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(status["state"], "work_running");
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "breakDurationSeconds"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "20");

    drop(lock);
    let reset = run_json(dir.path(), &["timer", "reset"]);
    assert_eq!(reset["state"], "idle");
}
