//! CLI smoke tests - verify basic binary behavior.

use std::io::Write;
use std::process::{Command, Stdio};

fn cli_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_eliza"))
}

/// Run a conversation with the given stdin and return stdout.
fn converse(args: &[&str], input: &str) -> String {
    let mut child = cli_bin()
        .arg("--config")
        .arg("/tmp/nonexistent_eliza_config_12345.toml")
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to run");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(input.as_bytes())
        .expect("failed to write stdin");
    let output = child.wait_with_output().expect("failed to wait");
    assert!(output.status.success());
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_help_flag() {
    let output = cli_bin().arg("--help").output().expect("failed to run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Usage"),
        "Expected usage info in --help output"
    );
    assert!(stdout.contains("--random"));
}

#[test]
fn test_version_flag() {
    let output = cli_bin().arg("--version").output().expect("failed to run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("eliza_cli"),
        "Expected crate name in --version output"
    );
}

#[test]
fn test_invalid_config_does_not_panic() {
    // Passing a nonexistent config file should not panic - it falls back to defaults
    let output = cli_bin()
        .arg("--config")
        .arg("/tmp/nonexistent_eliza_config_12345.toml")
        .arg("--help") // exit immediately via --help
        .output()
        .expect("failed to run");
    assert!(output.status.success());
}

#[test]
fn test_named_conversation_until_quit() {
    let stdout = converse(&["--name", "Alex"], "I am feeling stressed.\n\nquit\n");
    assert!(stdout.contains("Hi Alex."), "got {stdout}");
    assert!(stdout.contains("Why do you feel stressed, Alex?"), "got {stdout}");
    assert!(stdout.contains("I didn't catch that"), "got {stdout}");
}

#[test]
fn test_name_prompt_and_end_of_input() {
    let stdout = converse(&[], "Sam\n");
    assert!(stdout.contains("telling me your name"), "got {stdout}");
    assert!(stdout.contains("Hi Sam."), "got {stdout}");
}

#[test]
fn test_missing_rules_file_fails() {
    let output = cli_bin()
        .args(["--config", "/tmp/nonexistent_eliza_config_12345.toml"])
        .args(["--rules", "/tmp/nonexistent_eliza_rules_12345.toml"])
        .args(["--name", "Sam"])
        .stdin(Stdio::null())
        .output()
        .expect("failed to run");
    assert!(!output.status.success());
}

#[test]
fn test_seeded_sessions_are_reproducible() {
    let args = ["--name", "Sam", "--random", "--seed", "7"];
    let input = "I need a holiday\nmy mother hates computers\nquit\n";
    let first = converse(&args, input);
    let second = converse(&args, input);
    assert!(first.contains("Hi Sam."), "got {first}");
    assert_eq!(first, second);
}
