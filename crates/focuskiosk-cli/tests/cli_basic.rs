//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own temporary config
//! directory and checks stdout, stderr and the exit code.

use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(dir: &TempDir, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_focuskiosk"))
        .args(args)
        .env("FOCUSKIOSK_CONFIG_DIR", dir.path())
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_cli_success(dir: &TempDir, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(dir, args);
    assert_eq!(code, 0, "CLI command {args:?} failed: {stderr}");
    stdout
}

#[test]
fn test_settings_defaults() {
    let dir = TempDir::new().unwrap();
    assert_eq!(run_cli_success(&dir, &["settings", "get", "work_duration"]).trim(), "25");
    assert_eq!(run_cli_success(&dir, &["settings", "get", "break_duration"]).trim(), "5");
    assert_eq!(run_cli_success(&dir, &["settings", "get", "tone"]).trim(), "sine");
    assert!(dir.path().join("settings.toml").exists());
}

#[test]
fn test_settings_set_clamps_duration() {
    let dir = TempDir::new().unwrap();
    let out = run_cli_success(&dir, &["settings", "set", "work_duration", "500"]);
    assert_eq!(out.trim(), "work_duration = 120");
    assert_eq!(run_cli_success(&dir, &["settings", "get", "work_duration"]).trim(), "120");

    let out = run_cli_success(&dir, &["settings", "set", "break_duration", "0"]);
    assert_eq!(out.trim(), "break_duration = 1");
}

#[test]
fn test_settings_set_nested_key() {
    let dir = TempDir::new().unwrap();
    run_cli_success(&dir, &["settings", "set", "typography.clock_size", "42"]);
    assert_eq!(
        run_cli_success(&dir, &["settings", "get", "typography.clock_size"]).trim(),
        "42"
    );
}

#[test]
fn test_settings_unknown_key_fails() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&dir, &["settings", "get", "theme"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"), "stderr was: {stderr}");

    let (_, _, code) = run_cli(&dir, &["settings", "set", "theme", "dark"]);
    assert_eq!(code, 1);
}

#[test]
fn test_settings_invalid_tone_fails() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(&dir, &["settings", "set", "tone", "noise"]);
    assert_eq!(code, 1);
    assert_eq!(run_cli_success(&dir, &["settings", "get", "tone"]).trim(), "sine");
}

#[test]
fn test_settings_set_tone_any_case() {
    let dir = TempDir::new().unwrap();
    run_cli_success(&dir, &["settings", "set", "tone", "Square"]);
    assert_eq!(run_cli_success(&dir, &["settings", "get", "tone"]).trim(), "square");
}

#[test]
fn test_settings_bad_value_keeps_other_keys() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("settings.toml"),
        "work_duration = 50\nvolume = \"loud\"\n",
    )
    .unwrap();
    assert_eq!(run_cli_success(&dir, &["settings", "get", "work_duration"]).trim(), "50");
    assert_eq!(run_cli_success(&dir, &["settings", "get", "volume"]).trim(), "0.3");
}

#[test]
fn test_settings_list_and_reset() {
    let dir = TempDir::new().unwrap();
    run_cli_success(&dir, &["settings", "set", "volume", "0.8"]);
    let list: serde_json::Value =
        serde_json::from_str(&run_cli_success(&dir, &["settings", "list"])).unwrap();
    assert!((list["volume"].as_f64().unwrap() - 0.8).abs() < 1e-6);

    run_cli_success(&dir, &["settings", "reset"]);
    let list: serde_json::Value =
        serde_json::from_str(&run_cli_success(&dir, &["settings", "list"])).unwrap();
    assert!((list["volume"].as_f64().unwrap() - 0.3).abs() < 1e-6);
    assert_eq!(list["work_duration"], 25);
}

#[test]
fn test_tasks_add_list_remove() {
    let dir = TempDir::new().unwrap();
    run_cli_success(&dir, &["tasks", "add", "Walk", "outside"]);

    let tasks: Vec<String> =
        serde_json::from_str(&run_cli_success(&dir, &["tasks", "list", "--json"])).unwrap();
    assert_eq!(tasks, ["Deep Breath", "Stretch", "Drink Water", "Walk outside"]);

    let out = run_cli_success(&dir, &["tasks", "remove", "0"]);
    assert_eq!(out.trim(), "removed: Deep Breath");
    let tasks: Vec<String> =
        serde_json::from_str(&run_cli_success(&dir, &["tasks", "list", "--json"])).unwrap();
    assert_eq!(tasks, ["Stretch", "Drink Water", "Walk outside"]);

    let (_, stderr, code) = run_cli(&dir, &["tasks", "remove", "10"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("index 10"), "stderr was: {stderr}");
}

#[test]
fn test_sound_preview_dry_run() {
    let dir = TempDir::new().unwrap();
    let out = run_cli_success(&dir, &["sound", "preview", "--dry-run", "--tone", "triangle"]);
    let summary: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(summary["sound"], "preview");
    assert_eq!(summary["tone"], "triangle");
    assert_eq!(summary["frequency_hz"].as_f64(), Some(1760.0));
    assert_eq!(summary["points"], 3);
    assert!((summary["playback"]["stop_after"].as_f64().unwrap() - 0.6).abs() < 1e-9);
}

#[test]
fn test_sound_alarm_dry_run_loops() {
    let dir = TempDir::new().unwrap();
    let out = run_cli_success(&dir, &["sound", "alarm", "--dry-run"]);
    let summary: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(summary["playback"], "loop");
    assert_eq!(summary["frequency_hz"].as_f64(), Some(1000.0));
    assert_eq!(summary["points"], 6000);
}

#[test]
fn test_run_reads_commands_from_stdin() {
    let dir = TempDir::new().unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_focuskiosk"))
        .args(["run", "--json", "--mute", "--ephemeral", "--seed", "7"])
        .env("FOCUSKIOSK_CONFIG_DIR", dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to start kiosk");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"faces 1\nwork 3\nbogus\nstatus\nquit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let events: Vec<serde_json::Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let types: Vec<&str> = events.iter().map(|e| e["type"].as_str().unwrap()).collect();
    assert_eq!(
        types,
        [
            "DetectorReady",
            "PresenceChanged",
            "SettingsChanged",
            "CountdownReset",
            "StateSnapshot"
        ]
    );
    let snapshot = events.last().unwrap();
    assert_eq!(snapshot["mode"], "WORK");
    assert_eq!(snapshot["remaining"], "03:00");
    assert_eq!(snapshot["present"], true);

    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown command 'bogus'"));
    assert!(!dir.path().join("settings.toml").exists());
}
