//! CLI integration tests

use std::process::Command;

fn premium() -> Command {
    Command::new(env!("CARGO_BIN_EXE_premium"))
}

#[test]
fn test_cli_help() {
    let output = premium()
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(
        stdout.contains("Insurance Premium Predictor"),
        "Should show app name"
    );
    assert!(stdout.contains("predict"), "Should show predict command");
    assert!(stdout.contains("health"), "Should show health command");
    assert!(stdout.contains("--api-url"), "Should show api-url option");
}

#[test]
fn test_cli_version() {
    let output = premium()
        .arg("--version")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("premium"), "Should show binary name");
}

#[test]
fn test_predict_help_lists_profile_fields() {
    let output = premium()
        .args(["predict", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "Predict help should succeed");
    for flag in ["--age", "--sex", "--bmi", "--children", "--smoker", "--region"] {
        assert!(stdout.contains(flag), "Should show {} option", flag);
    }
}

#[test]
fn test_predict_requires_all_fields() {
    let output = premium()
        .args(["predict", "--age", "45", "--sex", "male"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Missing fields should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--bmi"), "Should name a missing option");
}

#[test]
fn test_invalid_format_rejected() {
    let output = premium()
        .args(["--format", "xml", "health"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Unknown format should fail");
}

#[test]
fn test_unreachable_server_fails() {
    let home = tempfile::tempdir().unwrap();
    let output = premium()
        .env("HOME", home.path())
        .args(["--api-url", "http://127.0.0.1:9", "health"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success(), "Unreachable server should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to send request"));
}
