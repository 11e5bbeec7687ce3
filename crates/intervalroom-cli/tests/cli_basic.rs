//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary data directory.

use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_intervalroom-cli"))
        .args(args)
        .env("INTERVALROOM_DATA_DIR", data_dir)
        .env_remove("INTERVALROOM_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(data_dir: &Path, args: &[&str]) -> serde_json::Value {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("stdout is JSON")
}

const SCENARIO: [&str; 10] = [
    "--warmup", "10", "--work", "20", "--rest", "10", "--rounds", "3", "--cooldown", "30",
];

fn scenario_args<'a>(prefix: &[&'a str]) -> Vec<&'a str> {
    let mut args = prefix.to_vec();
    args.extend_from_slice(&SCENARIO);
    args
}

#[test]
fn test_plan_show_reports_total() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, stderr, code) = run_cli(dir.path(), &scenario_args(&["plan", "show"]));
    assert_eq!(code, 0, "plan show failed: {stderr}");
    assert!(stdout.starts_with("total 02:00 (3 rounds)"), "{stdout}");
    assert!(stdout.contains("Warm-up"));
    assert!(stdout.contains("Cool-down"));
}

#[test]
fn test_plan_show_json_lists_phases() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_json(dir.path(), &scenario_args(&["plan", "show", "--json"]));
    assert_eq!(out["total_secs"], 120);
    // warmup, 3 work, 2 rest, cooldown
    assert_eq!(out["phases"].as_array().unwrap().len(), 7);
}

#[test]
fn test_plan_show_uses_config_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_json(dir.path(), &["plan", "show", "--json"]);
    assert_eq!(out["total_secs"], 270);
}

#[test]
fn test_plan_at_previews_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_json(dir.path(), &scenario_args(&["plan", "at", "35"]));
    assert_eq!(out["phase"], "rest");
    assert_eq!(out["round"], 1);
    assert_eq!(out["remaining_secs"], 5);

    let out = run_json(dir.path(), &scenario_args(&["plan", "at", "500"]));
    assert_eq!(out["phase"], "finished");
    assert_eq!(out["elapsed_secs"], 120);
}

#[test]
fn test_zero_rounds_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["plan", "show", "--rounds", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"), "{stderr}");

    let (_, _, code) = run_cli(dir.path(), &["timer", "start", "--rounds", "0"]);
    assert_eq!(code, 1);
}

#[test]
fn test_unknown_preset_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["plan", "show", "--preset", "hiit"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("hiit"), "{stderr}");
}

#[test]
fn test_timer_status_without_session() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(out["status"], "not_started");
    assert!(out["event"].is_null());
    assert_eq!(out["snapshot"]["phase"], "idle");
}

#[test]
fn test_timer_lifecycle_across_invocations() {
    let dir = tempfile::tempdir().unwrap();

    let out = run_json(dir.path(), &scenario_args(&["timer", "start"]));
    assert_eq!(out["status"], "running");
    assert_eq!(out["event"]["type"], "session_started");
    assert_eq!(out["snapshot"]["phase"], "warmup");

    // Second start is a no-op against the persisted session.
    let out = run_json(dir.path(), &scenario_args(&["timer", "start"]));
    assert_eq!(out["status"], "running");
    assert!(out["event"].is_null());

    let out = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(out["status"], "running");
    assert_eq!(out["event"]["type"], "session_recovered");
    assert_eq!(out["snapshot"]["total_secs"], 120);

    let out = run_json(dir.path(), &["timer", "pause"]);
    assert_eq!(out["status"], "paused");
    assert_eq!(out["event"]["type"], "session_paused");
    assert_eq!(out["snapshot"]["is_running"], false);

    let out = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(out["status"], "paused");

    let out = run_json(dir.path(), &["timer", "resume"]);
    assert_eq!(out["status"], "running");
    assert_eq!(out["event"]["type"], "session_resumed");

    let out = run_json(dir.path(), &["timer", "stop"]);
    assert_eq!(out["status"], "stopped");
    assert_eq!(out["event"]["type"], "session_stopped");
    assert_eq!(out["snapshot"]["phase"], "finished");

    let out = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(out["status"], "not_started");
}

#[test]
fn test_timer_commands_without_session_are_noops() {
    let dir = tempfile::tempdir().unwrap();
    for cmd in ["pause", "resume", "stop"] {
        let out = run_json(dir.path(), &["timer", cmd]);
        assert_eq!(out["status"], "not_started", "{cmd}");
        assert!(out["event"].is_null(), "{cmd}");
    }
}

#[test]
fn test_one_shot_commands_refused_while_runner_owns_session() {
    let dir = tempfile::tempdir().unwrap();
    let mut runner = Command::new(env!("CARGO_BIN_EXE_intervalroom-cli"))
        .args(scenario_args(&["timer", "run"]))
        .env("INTERVALROOM_DATA_DIR", dir.path())
        .env_remove("INTERVALROOM_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn runner");

    // Wait until the runner has started the session and owns it.
    let mut stderr = BufReader::new(runner.stderr.take().unwrap());
    let mut line = String::new();
    loop {
        line.clear();
        let n = stderr.read_line(&mut line).unwrap();
        assert!(n > 0, "runner exited before printing controls");
        if line.contains("controls:") {
            break;
        }
    }
    let drain = std::thread::spawn(move || {
        let mut rest = String::new();
        let _ = stderr.read_to_string(&mut rest);
    });

    let (_, err, code) = run_cli(dir.path(), &["timer", "pause"]);
    assert_eq!(code, 1, "pause must be refused while the runner is live");
    assert!(err.contains("timer run"), "{err}");

    let (_, _, code) = run_cli(dir.path(), &scenario_args(&["timer", "start"]));
    assert_eq!(code, 1);

    // Read-only status is still served.
    let out = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(out["status"], "running");

    let mut stdin = runner.stdin.take().unwrap();
    stdin.write_all(b"s\n").unwrap();
    stdin.flush().unwrap();
    let status = runner.wait().unwrap();
    assert!(status.success());
    drop(stdin);
    drain.join().unwrap();

    let out = run_json(dir.path(), &["timer", "status"]);
    assert_eq!(out["status"], "not_started");
    let out = run_json(dir.path(), &["timer", "pause"]);
    assert_eq!(out["status"], "not_started");
}

#[test]
fn test_config_get_set() {
    let dir = tempfile::tempdir().unwrap();

    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "plan.rounds"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "8");

    let (stdout, _, code) = run_cli(dir.path(), &["config", "set", "plan.rounds", "4"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "ok");

    let out = run_json(dir.path(), &["plan", "show", "--json"]);
    assert_eq!(out["plan"]["rounds"], 4);

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "plan.rounds", "0"]);
    assert_eq!(code, 1);
    let (_, _, code) = run_cli(dir.path(), &["config", "get", "cues.missing"]);
    assert_eq!(code, 1);
}

#[test]
fn test_config_list_and_reset() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["config", "set", "cues.sound", "false"]);
    assert_eq!(code, 0);

    let out = run_json(dir.path(), &["config", "list"]);
    assert_eq!(out["cues"]["sound"], false);

    let (_, _, code) = run_cli(dir.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    let out = run_json(dir.path(), &["config", "list"]);
    assert_eq!(out["cues"]["sound"], true);
}
