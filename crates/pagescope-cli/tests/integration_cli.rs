//! Black-box tests for the pagescope binary.
//!
//! Everything here runs without Chrome: `replay` drives the same engine from
//! a recording, and `watch` is only exercised up to argument and config
//! validation.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

/// The binary, run from an empty directory so no stray pagescope.json is
/// picked up.
fn pagescope(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pagescope").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("PAGESCOPE_WINDOW_MS")
        .env_remove("PAGESCOPE_OUTPUT")
        .env("NO_COLOR", "1");
    cmd
}

fn json_report(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).expect("stdout is one JSON document")
}

#[test]
fn test_help() {
    let temp = TempDir::new().unwrap();
    pagescope(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("replay"));
}

#[test]
fn test_replay_json_reproduces_window() {
    let temp = TempDir::new().unwrap();
    let output = pagescope(&temp)
        .args(["--quiet", "replay", "--window", "1000", "--output", "json"])
        .arg(fixture("window.jsonl"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let report = json_report(&output.stdout);
    let counts = &report["summary"]["counts"];
    assert_eq!(counts["successful"], 1);
    assert_eq!(counts["clean"], 1);
    assert_eq!(counts["failed"], 1);
    assert_eq!(counts["pending"], 1);
    assert!(report["summary"]["stuck"].as_array().unwrap().is_empty());
    assert_eq!(report["summary"]["pendingByCategory"]["script"][0]["url"], "https://cdn.test/app.js");

    let network = report["network"].as_array().unwrap();
    assert_eq!(network.len(), 3);
    assert_eq!(network[0]["outcome"]["status"], 200);
    assert_eq!(network[0]["outcome"]["durationMs"], 180);
    assert_eq!(network[1]["outcome"]["status"], 404);
    assert_eq!(network[2]["outcome"]["state"], "pending");

    let console = report["console"].as_array().unwrap();
    assert_eq!(console.len(), 3);
    assert_eq!(console[0]["severity"], "error");
    assert_eq!(console[2]["type"], "pageError");
}

#[test]
fn test_replay_long_window_marks_stuck() {
    let temp = TempDir::new().unwrap();
    let output = pagescope(&temp)
        .args(["-q", "replay", "-w", "6000", "-o", "json"])
        .arg(fixture("window.jsonl"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let report = json_report(&output.stdout);
    let stuck = report["summary"]["stuck"].as_array().unwrap();
    assert_eq!(stuck.len(), 1);
    assert_eq!(stuck[0]["ageMs"], 6000);
}

#[test]
fn test_replay_text_report() {
    let temp = TempDir::new().unwrap();
    pagescope(&temp)
        .args(["--no-color", "replay", "--window", "1000", "--show-headers"])
        .arg(fixture("window.jsonl"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Console (3)"))
        .stdout(predicate::str::contains("[pageerror] Uncaught TypeError: app is undefined"))
        .stdout(predicate::str::contains("GET https://shop.test/missing.css 404"))
        .stdout(predicate::str::contains("< content-type: text/html"))
        .stdout(predicate::str::contains("3 requests: 1 successful (1 clean), 1 failed, 1 pending"))
        .stdout(predicate::str::contains("Pending scripts (1): functionality is likely broken"))
        .stderr(predicate::str::contains("1 failed, 0 stuck of 3 requests"));
}

#[test]
fn test_failure_threshold_flag() {
    let temp = TempDir::new().unwrap();
    let output = pagescope(&temp)
        .args(["-q", "replay", "-w", "1000", "-o", "json", "--failure-status", "500"])
        .arg(fixture("window.jsonl"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let counts = json_report(&output.stdout)["summary"]["counts"].clone();
    assert_eq!(counts["successful"], 2);
    assert_eq!(counts["clean"], 1);
    assert_eq!(counts["failed"], 0);
}

#[test]
fn test_replay_missing_file() {
    let temp = TempDir::new().unwrap();
    pagescope(&temp)
        .args(["replay", "nope.jsonl"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.jsonl"));
}

#[test]
fn test_replay_invalid_line_reports_line_number() {
    let temp = TempDir::new().unwrap();
    let recording = temp.path().join("bad.jsonl");
    fs::write(
        &recording,
        "{\"atMs\": 0, \"event\": \"request\", \"url\": \"https://a.test/\"}\n{\"atMs\": 5, \"event\": \"teleport\"}\n",
    )
    .unwrap();

    pagescope(&temp)
        .arg("replay")
        .arg(&recording)
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"));
}

#[test]
fn test_watch_rejects_zero_window() {
    let temp = TempDir::new().unwrap();
    pagescope(&temp)
        .args(["watch", "https://example.com", "--window", "0"])
        .assert()
        .failure();
}

#[test]
fn test_watch_rejects_unsupported_scheme() {
    let temp = TempDir::new().unwrap();
    pagescope(&temp)
        .args(["watch", "ftp://example.com"])
        .assert()
        .failure();
}

#[test]
fn test_watch_requires_url() {
    let temp = TempDir::new().unwrap();
    pagescope(&temp)
        .arg("watch")
        .assert()
        .failure()
        .stderr(predicate::str::contains("url"));
}

#[test]
fn test_schema_lists_properties() {
    let temp = TempDir::new().unwrap();
    pagescope(&temp)
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("windowMs"))
        .stdout(predicate::str::contains("staleThresholdMs"));
}

#[test]
fn test_schema_example_is_valid_config() {
    let temp = TempDir::new().unwrap();
    let output = pagescope(&temp).args(["schema", "--example"]).output().unwrap();
    assert!(output.status.success());

    fs::write(temp.path().join("pagescope.json"), &output.stdout).unwrap();
    // The example sets an 8s window; replay picks it up from ./pagescope.json.
    let output = pagescope(&temp)
        .args(["-q", "replay", "-o", "json"])
        .arg(fixture("window.jsonl"))
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(json_report(&output.stdout)["summary"]["stuck"].as_array().unwrap().len(), 1);
}

#[test]
fn test_config_precedence_file_env_flag() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("scope.toml"),
        "windowMs = 6000\noutput = \"json\"\n",
    )
    .unwrap();

    let stuck_count = |cmd: &mut Command| {
        let output = cmd.output().unwrap();
        assert!(output.status.success());
        json_report(&output.stdout)["summary"]["stuck"].as_array().unwrap().len()
    };

    // File alone: 6s window, the script is stuck.
    let mut from_file = pagescope(&temp);
    from_file.args(["-q", "replay", "-c", "scope.toml"]).arg(fixture("window.jsonl"));
    assert_eq!(stuck_count(&mut from_file), 1);

    // Env beats the file.
    let mut from_env = pagescope(&temp);
    from_env
        .env("PAGESCOPE_WINDOW_MS", "1000")
        .args(["-q", "replay", "-c", "scope.toml"])
        .arg(fixture("window.jsonl"));
    assert_eq!(stuck_count(&mut from_env), 0);

    // Flags beat the environment.
    let mut from_flag = pagescope(&temp);
    from_flag
        .env("PAGESCOPE_WINDOW_MS", "1000")
        .args(["-q", "replay", "-c", "scope.toml", "--window", "7000"])
        .arg(fixture("window.jsonl"));
    assert_eq!(stuck_count(&mut from_flag), 1);
}
