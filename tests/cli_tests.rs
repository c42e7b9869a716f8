// CLI integration tests
// These test the actual command-line interface using the compiled binary

use std::process::Command;

const CLI_BINARY: &str = env!("CARGO_BIN_EXE_netatmo");

#[test]
fn test_cli_devices_command_no_credentials() {
    // Without credentials the CLI must fail before any network activity,
    // naming the first missing field.
    let output = Command::new(CLI_BINARY)
        .arg("devices")
        .env_remove("NETATMO_CLIENT_ID")
        .env_remove("NETATMO_CLIENT_SECRET")
        .env_remove("NETATMO_USERNAME")
        .env_remove("NETATMO_PASSWORD")
        .env("HOME", "/nonexistent")
        .output()
        .expect("Failed to execute CLI");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("client_id"));
}

#[test]
fn test_cli_help_command() {
    let output = Command::new(CLI_BINARY)
        .arg("--help")
        .output()
        .expect("Failed to execute CLI");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("A CLI for querying Netatmo weather stations and thermostats"));
    assert!(stdout.contains("devices"));
    assert!(stdout.contains("stations"));
}

#[test]
fn test_cli_version_command() {
    let output = Command::new(CLI_BINARY)
        .arg("--version")
        .output()
        .expect("Failed to execute CLI");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("netatmo"));
}

#[test]
fn test_cli_invalid_command() {
    let output = Command::new(CLI_BINARY)
        .arg("invalid-command")
        .output()
        .expect("Failed to execute CLI");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:") || stderr.contains("unrecognized"));
}

#[test]
fn test_cli_devices_help_includes_app_type() {
    let output = Command::new(CLI_BINARY)
        .args(["devices", "--help"])
        .output()
        .expect("Failed to execute CLI");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--app-type"));
}

#[test]
fn test_cli_stations_help_includes_app_type() {
    let output = Command::new(CLI_BINARY)
        .args(["stations", "--help"])
        .output()
        .expect("Failed to execute CLI");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--app-type"));
}
