// crates/policy-flow-cli/tests/cli_commands.rs
// ============================================================================
// Module: CLI Command Tests
// Description: Integration tests for the validate and execute commands.
// Purpose: Ensure the binary reports decisions and fails closed on errors.
// Dependencies: policy-flow-cli binary
// ============================================================================

//! ## Overview
//! Runs the `policy-flow` binary against policy files written to a temp
//! directory and checks stdout, stderr, and exit status.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Output;

use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn policy_flow_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_policy-flow"))
}

const AGE_GATE: &str = r#"{
  "name": "age gate",
  "variables": ["age"],
  "blocks": {
    "1": {"block_type": "StartBlock", "next_block": "2"},
    "2": {"block_type": "ConditionalBlock", "variable": "age", "operator": ">=",
          "cmp_value": "18", "true_branch": "3", "false_branch": "4"},
    "3": {"block_type": "EndBlock", "decision_value": "Approved"},
    "4": {"block_type": "EndBlock", "decision_value": "Denied"}
  }
}"#;

fn write_policy(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("policy.json");
    fs::write(&path, contents).unwrap();
    path
}

fn run(args: &[&str]) -> Output {
    Command::new(policy_flow_bin()).args(args).output().expect("run policy-flow")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ============================================================================
// SECTION: Validate
// ============================================================================

/// Verifies a well-formed policy validates.
#[test]
fn cli_validate_accepts_policy() {
    let temp = TempDir::new().unwrap();
    let path = write_policy(temp.path(), AGE_GATE);
    let output = run(&["validate", path.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "valid");
}

/// Verifies a policy with a dangling branch is reported.
#[test]
fn cli_validate_reports_structural_error() {
    let temp = TempDir::new().unwrap();
    let dangling = AGE_GATE.replace("\"false_branch\": \"4\"", "\"false_branch\": \"9\"");
    let path = write_policy(temp.path(), &dangling);
    let output = run(&["validate", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("invalid policy"));
    assert!(stderr(&output).contains("'9'"));
}

/// Verifies non-policy JSON is reported as a format error.
#[test]
fn cli_validate_rejects_malformed_json() {
    let temp = TempDir::new().unwrap();
    let path = write_policy(temp.path(), "{\"name\": 1}");
    let output = run(&["validate", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid policy format"));
}

/// Verifies a missing file fails.
#[test]
fn cli_validate_fails_for_missing_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("absent.json");
    let output = run(&["validate", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("failed to read"));
}

// ============================================================================
// SECTION: Execute
// ============================================================================

/// Verifies both branches of the age gate.
#[test]
fn cli_execute_prints_decision() {
    let temp = TempDir::new().unwrap();
    let path = write_policy(temp.path(), AGE_GATE);
    let file = path.to_str().unwrap();

    let adult = run(&["execute", file, "--var", "age=25"]);
    assert!(adult.status.success(), "stderr: {}", stderr(&adult));
    assert_eq!(stdout(&adult).trim(), "Approved");

    let minor = run(&["execute", file, "--var", "age=17.5"]);
    assert_eq!(stdout(&minor).trim(), "Denied");
}

/// Verifies the traced path is printed on request.
#[test]
fn cli_execute_prints_trace() {
    let temp = TempDir::new().unwrap();
    let path = write_policy(temp.path(), AGE_GATE);
    let output = run(&["execute", path.to_str().unwrap(), "--var", "age=30", "--trace"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "Approved\npath: 1 -> 2 -> 3\n");
}

/// Verifies an undeclared variable is rejected.
#[test]
fn cli_execute_rejects_unexpected_variable() {
    let temp = TempDir::new().unwrap();
    let path = write_policy(temp.path(), AGE_GATE);
    let output =
        run(&["execute", path.to_str().unwrap(), "--var", "age=30", "--var", "income=1"]);
    assert!(!output.status.success());
    assert!(stderr(&output).starts_with("unexpected_variable:"));
    assert!(stdout(&output).is_empty());
}

/// Verifies a missing variable is rejected.
#[test]
fn cli_execute_rejects_missing_variable() {
    let temp = TempDir::new().unwrap();
    let path = write_policy(temp.path(), AGE_GATE);
    let output = run(&["execute", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).starts_with("missing_variable:"));
}

/// Verifies text compared against a number fails rather than guessing.
#[test]
fn cli_execute_reports_incomparable_operands() {
    let temp = TempDir::new().unwrap();
    let path = write_policy(temp.path(), AGE_GATE);
    let output = run(&["execute", path.to_str().unwrap(), "--var", "age=adult"]);
    assert!(!output.status.success());
    assert!(stderr(&output).starts_with("incomparable_operands:"));
}

/// Verifies the step limit override reaches the engine.
#[test]
fn cli_execute_honors_max_steps() {
    let temp = TempDir::new().unwrap();
    let path = write_policy(temp.path(), AGE_GATE);
    let output =
        run(&["execute", path.to_str().unwrap(), "--var", "age=30", "--max-steps", "1"]);
    assert!(!output.status.success());
    assert!(stderr(&output).starts_with("traversal_step_limit_exceeded:"));
}

/// Verifies a variable passed twice is rejected rather than overwritten.
#[test]
fn cli_execute_rejects_repeated_var() {
    let temp = TempDir::new().unwrap();
    let path = write_policy(temp.path(), AGE_GATE);
    let output =
        run(&["execute", path.to_str().unwrap(), "--var", "age=30", "--var", "age=12"]);
    assert!(!output.status.success());
    assert!(stderr(&output).starts_with("duplicate_variable:"));
}

/// Verifies malformed bindings are rejected by argument parsing.
#[test]
fn cli_execute_rejects_malformed_var() {
    let temp = TempDir::new().unwrap();
    let path = write_policy(temp.path(), AGE_GATE);
    let output = run(&["execute", path.to_str().unwrap(), "--var", "age"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("NAME=VALUE"));
}

// ============================================================================
// SECTION: Serve
// ============================================================================

/// Verifies `serve` fails closed on invalid configuration.
#[test]
fn cli_serve_rejects_invalid_config() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("policy-flow.toml");
    fs::write(&config, "[store]\ntype = \"sqlite\"\n").unwrap();
    let output = run(&["serve", "--config", config.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("sqlite store requires path"));
}
