//! Integration tests for the ratewatch CLI

use std::io::Write;
use std::process::Command;

fn ratewatch() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_ratewatch"));
    for var in [
        "RATEWATCH_TICK_MS",
        "RATEWATCH_WINDOW_SECS",
        "RATEWATCH_MAX_WORKERS",
        "RATEWATCH_CONNECT_TIMEOUT",
        "RATEWATCH_CONFIG",
        "RUST_LOG",
    ] {
        command.env_remove(var);
    }
    command
}

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp config");
    file.write_all(contents.as_bytes())
        .expect("Failed to write temp config");
    file
}

#[test]
fn test_cli_version() {
    let output = ratewatch()
        .arg("--version")
        .output()
        .expect("Failed to execute ratewatch");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ratewatch"));
}

#[test]
fn test_cli_help() {
    let output = ratewatch()
        .arg("--help")
        .output()
        .expect("Failed to execute ratewatch");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Rolling download throughput monitor"));
    assert!(stdout.contains("watch"));
    assert!(stdout.contains("probe"));
}

#[test]
fn test_cli_invalid_command() {
    let output = ratewatch()
        .arg("invalid-command")
        .output()
        .expect("Failed to execute ratewatch");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unrecognized subcommand"));
}

#[test]
fn test_watch_without_links_fails() {
    let config = config_file("[sampling]\ntick_ms = 1000\n");

    let output = ratewatch()
        .args(["--color", "never", "--config"])
        .arg(config.path())
        .arg("watch")
        .output()
        .expect("Failed to execute ratewatch");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing required field: links"));
}

#[test]
fn test_malformed_config_is_reported() {
    let config = config_file("links = \"not a list\"\n");

    let output = ratewatch()
        .arg("--config")
        .arg(config.path())
        .arg("probe")
        .output()
        .expect("Failed to execute ratewatch");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Configuration error"));
}

#[test]
fn test_zero_tick_rejected() {
    let config = config_file("");

    let output = ratewatch()
        .arg("--config")
        .arg(config.path())
        .args(["watch", "--url", "a=https://example.invalid/a", "--tick-ms", "0"])
        .output()
        .expect("Failed to execute ratewatch");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("sampling.tick_ms"));
}
