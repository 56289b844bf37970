//! CLI binary integration tests.
//!
//! These tests exercise the compiled `hostshell` binary to verify command
//! routing, exit codes, and error handling.

use hostshell_integration_tests::hostshell_cmd;
use std::process::Output;
use tempfile::TempDir;

/// Run `hostshell` confined to `work` with isolation off.
fn run_in(home: &TempDir, work: &TempDir, args: &[&str]) -> Output {
    hostshell_cmd(home.path())
        .arg("--isolation")
        .arg("none")
        .arg("--working-dir")
        .arg(work.path())
        .args(args)
        .output()
        .expect("failed to run hostshell")
}

#[test]
fn test_cli_version() {
    let home = TempDir::new().unwrap();
    let output = hostshell_cmd(home.path())
        .arg("version")
        .output()
        .expect("failed to run hostshell");
    assert!(output.status.success(), "version command should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("hostshell"), "got: {}", stdout);
}

#[test]
fn test_cli_help() {
    let home = TempDir::new().unwrap();
    let output = hostshell_cmd(home.path())
        .arg("--help")
        .output()
        .expect("failed to run hostshell");
    assert!(output.status.success(), "--help should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["exec", "script", "shell", "doctor", "config"] {
        assert!(stdout.contains(command), "help should mention '{}'", command);
    }
}

#[test]
fn test_cli_unknown_command() {
    let home = TempDir::new().unwrap();
    let output = hostshell_cmd(home.path())
        .arg("nonexistent-command")
        .output()
        .expect("failed to run hostshell");
    assert!(!output.status.success());
}

#[test]
fn test_exec_prints_output() {
    let (home, work) = (TempDir::new().unwrap(), TempDir::new().unwrap());
    let output = run_in(&home, &work, &["exec", "echo", "hello", "world"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello world");
}

#[test]
fn test_exec_propagates_exit_code() {
    let (home, work) = (TempDir::new().unwrap(), TempDir::new().unwrap());
    let output = run_in(&home, &work, &["script", "exit 5"]);
    assert_eq!(output.status.code(), Some(5));
}

#[test]
fn test_exec_timeout_exit_code() {
    let (home, work) = (TempDir::new().unwrap(), TempDir::new().unwrap());
    let output = run_in(&home, &work, &["exec", "--timeout", "1", "sleep", "5"]);
    assert_eq!(output.status.code(), Some(124));
}

#[test]
fn test_script_json_output() {
    let (home, work) = (TempDir::new().unwrap(), TempDir::new().unwrap());
    let output = run_in(
        &home,
        &work,
        &["script", "--json", "echo $GREETING", "--env", "GREETING=hi"],
    );
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["type"], "success");
    assert_eq!(json["output"], "hi");
}

#[test]
fn test_missing_working_directory_fails() {
    let home = TempDir::new().unwrap();
    let missing = home.path().join("missing");
    let output = hostshell_cmd(home.path())
        .args(["--isolation", "none", "--working-dir"])
        .arg(&missing)
        .args(["exec", "true"])
        .output()
        .expect("failed to run hostshell");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Working directory does not exist"), "got: {}", stderr);
}

#[test]
fn test_config_init_and_path() {
    let home = TempDir::new().unwrap();
    let init = hostshell_cmd(home.path())
        .args(["config", "init"])
        .output()
        .expect("failed to run hostshell");
    assert!(init.status.success());
    assert!(home.path().join("hostshell.json5").exists());

    let path = hostshell_cmd(home.path())
        .args(["config", "path"])
        .output()
        .expect("failed to run hostshell");
    let stdout = String::from_utf8_lossy(&path.stdout);
    assert_eq!(stdout.trim(), home.path().join("hostshell.json5").to_string_lossy());
}
