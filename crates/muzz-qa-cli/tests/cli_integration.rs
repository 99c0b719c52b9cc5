use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

/// A config file with short waits and no like pacing.
fn fast_config_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"default_wait_ms":500,"login_timeout_ms":1000,"idle_timeout_ms":1000,"poll_interval_ms":10,"like_pacing_ms":0}}"#
    )
    .unwrap();
    file
}

fn muzz_qa() -> Command {
    let mut cmd = Command::cargo_bin("muzz-qa").unwrap();
    cmd.env_remove("MUZZ_QA_HOST").env_remove("MUZZ_QA_PORT");
    cmd
}

#[test]
fn test_help_exits_zero() {
    muzz_qa()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("muzz-qa"));
}

#[test]
fn test_list_shows_every_scenario() {
    let assert = muzz_qa().arg("list").assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();

    assert_eq!(stdout.lines().count(), 20);
    assert!(stdout.contains("successful_login"));
    assert!(stdout.contains("retry_after_network_error"));
}

#[test]
fn test_list_json_filtered_by_feature() {
    let assert = muzz_qa()
        .args(["-f", "json", "list", "--feature", "login"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();

    let entries: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 12);
    assert!(entries.iter().all(|e| e["feature"] == "login"));
}

#[test]
fn test_unknown_feature_is_rejected() {
    muzz_qa()
        .args(["list", "--feature", "chat"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown feature"));
}

#[test]
fn test_run_simulated_login_suite_passes() {
    let config = fast_config_file();
    muzz_qa()
        .args(["--config", config.path().to_str().unwrap()])
        .args(["run", "--simulated", "--feature", "login"])
        .assert()
        .success()
        .stdout(predicate::str::contains("12 passed, 0 failed"))
        .stdout(predicate::str::contains("TEST PASSED: successful_login"));
}

#[test]
fn test_run_json_report_parses() {
    let config = fast_config_file();
    let assert = muzz_qa()
        .args(["--config", config.path().to_str().unwrap(), "-f", "json"])
        .args(["run", "--simulated", "--filter", "login_fails"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();

    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let scenarios = report["scenarios"].as_array().unwrap();
    assert_eq!(scenarios.len(), 4);
    assert!(scenarios.iter().all(|s| s["verdict"] == "passed"));
    assert!(report["run_id"].is_string());
}

#[test]
fn test_run_with_network_error_recovers() {
    let config = fast_config_file();
    muzz_qa()
        .args(["--config", config.path().to_str().unwrap()])
        .args(["run", "--simulated", "--network-error"])
        .args(["--filter", "retry_after_network_error"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Retry successful"));
}

#[test]
fn test_failing_scenario_exits_one() {
    let config = fast_config_file();
    muzz_qa()
        .args(["--config", config.path().to_str().unwrap()])
        .args(["run", "--simulated", "--profiles", "0"])
        .args(["--filter", "successful_login"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("0 passed, 1 failed"))
        .stderr(predicate::str::contains("1 scenario(s) failed"));
}

#[test]
fn test_unreachable_agent_exits_two() {
    let config = fast_config_file();
    muzz_qa()
        .args(["--config", config.path().to_str().unwrap()])
        .args(["--host", "127.0.0.1", "--port", "1"])
        .args(["run", "--feature", "login"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Connection error"));
}

#[test]
fn test_invalid_config_exits_three() {
    let mut config = NamedTempFile::new().unwrap();
    write!(config, "{{ not json").unwrap();

    muzz_qa()
        .args(["--config", config.path().to_str().unwrap()])
        .args(["run", "--simulated"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Config error"));
}

#[test]
fn test_missing_config_exits_three() {
    muzz_qa()
        .args(["--config", "/nonexistent/muzz-qa/config.json"])
        .args(["run", "--simulated"])
        .assert()
        .code(3);
}

#[test]
fn test_profiles_requires_simulated() {
    muzz_qa()
        .args(["run", "--profiles", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--simulated"));
}

#[test]
fn test_init_writes_config_with_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("muzz").join("config.json");

    muzz_qa()
        .args(["--config", path.to_str().unwrap()])
        .args(["--host", "10.0.2.2", "--port", "9801", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["agent_host"], "10.0.2.2");
    assert_eq!(written["agent_port"], 9801);
    assert_eq!(written["like_pacing_ms"], 500);

    // The written file is accepted as --config by later runs.
    muzz_qa()
        .args(["--config", path.to_str().unwrap(), "list"])
        .assert()
        .success();
}
