//! CLI integration tests

use std::process::Command;

fn run_cli(args: &[&str]) -> std::process::Output {
    let mut full = vec!["run", "-q", "-p", "heal-cli", "--"];
    full.extend_from_slice(args);
    Command::new("cargo")
        .args(&full)
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = run_cli(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Heal backend"), "Should show app description");
    assert!(stdout.contains("predict"), "Should show predict command");
    assert!(stdout.contains("landing"), "Should show landing command");
    assert!(stdout.contains("status"), "Should show status command");
    assert!(stdout.contains("--api-url"), "Should show api-url option");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = run_cli(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("heal"), "Should show binary name");
}

/// Test predict subcommand help
#[test]
fn test_predict_help() {
    let output = run_cli(&["predict", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Predict help should succeed");
    assert!(stdout.contains("--user"), "Should show user option");
    assert!(stdout.contains("--screening"), "Should show screening option");
}

/// Test landing subcommand help
#[test]
fn test_landing_help() {
    let output = run_cli(&["landing", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Landing help should succeed");
    assert!(stdout.contains("--user"), "Should show user option");
}

/// Test that predict requires both ids
#[test]
fn test_predict_requires_screening() {
    let output = run_cli(&["predict", "--user", "usr_100"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Missing screening should fail");
    assert!(stderr.contains("--screening"), "Should name the missing option");
}

/// Test that an unknown output format is rejected
#[test]
fn test_invalid_format() {
    let output = run_cli(&["--format", "yaml", "status"]);

    assert!(!output.status.success(), "Unknown format should fail");
}
