use std::fs;
use std::process::Command;

use assert_cmd::prelude::*;
use serde_json::Value;

fn sureclick() -> Command {
    let mut cmd = Command::cargo_bin("sureclick").expect("binary built");
    cmd.env_remove("SURECLICK_POLICY_OVERRIDE_JSON")
        .env("RUST_LOG", "error");
    cmd
}

#[test]
fn policy_command_layers_file_and_env() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("policy.yaml");
    fs::write(&path, "resolve:\n  timeout_ms: 2500\n").unwrap();

    let assert = sureclick()
        .env("SURECLICK_POLICY__SEARCH__MAX_PAGE_HOPS", "9")
        .args(["--config", path.to_str().unwrap(), "--output", "json", "policy"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let value: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["resolve"]["timeout_ms"].as_u64(), Some(2500));
    assert_eq!(value["search"]["max_page_hops"].as_u64(), Some(9));
    assert_eq!(value["action"]["stale_retries"].as_u64(), Some(2));
}

#[test]
fn policy_sources_are_listed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("policy.yaml");
    fs::write(&path, "readiness:\n  poll_interval_ms: 50\n").unwrap();

    let assert = sureclick()
        .args(["--config", path.to_str().unwrap(), "policy", "--sources"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    assert!(stdout.contains("poll_interval_ms: 50"));
    assert!(stdout.contains("# readiness.poll_interval_ms: File"));
    assert!(stdout.contains("# resolve.timeout_ms: Builtin"));
}

#[test]
fn json_sources_are_a_structured_field() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("policy.yaml");
    fs::write(&path, "readiness:\n  poll_interval_ms: 50\n").unwrap();

    let assert = sureclick()
        .args(["--config", path.to_str().unwrap(), "--output", "json", "policy", "--sources"])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let value: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["policy"]["readiness"]["poll_interval_ms"].as_u64(), Some(50));
    assert_eq!(value["sources"]["readiness.poll_interval_ms"], "File");
    assert_eq!(value["sources"]["resolve.timeout_ms"], "Builtin");
}

#[test]
fn invalid_policy_fails_the_command() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("policy.yaml");
    fs::write(&path, "action:\n  poll_interval_ms: 0\n").unwrap();

    sureclick()
        .args(["--config", path.to_str().unwrap(), "policy"])
        .assert()
        .failure();
}

#[test]
fn missing_policy_file_fails_the_command() {
    sureclick()
        .args(["--config", "/nonexistent/sureclick.yaml", "policy"])
        .assert()
        .failure();
}

#[test]
fn click_requires_an_expected_url() {
    sureclick()
        .args(["probe", "--url", "https://example.test", "--locator", "css=#go", "--click"])
        .assert()
        .failure();
}
