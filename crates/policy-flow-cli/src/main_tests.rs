// crates/policy-flow-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Argument Helper Tests
// Description: Unit tests for binding parsing and limit handling.
// Purpose: Ensure CLI inputs are rejected before any policy is read.
// Dependencies: policy-flow-cli
// ============================================================================

//! ## Overview
//! Exercises the private argument helpers used by the `execute` command.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test fixtures use explicit asserts and unwraps for clarity."
)]

use super::bindings_from_vars;
use super::execution_limits;
use super::parse_var;

#[test]
fn parse_var_splits_on_first_equals() {
    assert_eq!(parse_var("age=18").unwrap(), ("age".to_string(), "18".to_string()));
    assert_eq!(parse_var("expr=a=b").unwrap(), ("expr".to_string(), "a=b".to_string()));
    assert_eq!(parse_var("blank=").unwrap(), ("blank".to_string(), String::new()));
}

#[test]
fn parse_var_rejects_malformed_pairs() {
    assert!(parse_var("age").is_err());
    assert!(parse_var("=18").is_err());
}

#[test]
fn bindings_from_vars_rejects_duplicates() {
    let vars = vec![("age".to_string(), "1".to_string()), ("age".to_string(), "2".to_string())];
    let err = bindings_from_vars(vars).unwrap_err();
    assert_eq!(err.to_string(), "duplicate_variable: variable(s) 'age' supplied more than once");
}

#[test]
fn execution_limits_bounds_overrides() {
    assert_eq!(execution_limits(None).unwrap().max_steps, None);
    assert_eq!(execution_limits(Some(3)).unwrap().max_steps, Some(3));
    assert!(execution_limits(Some(0)).is_err());
    assert!(execution_limits(Some(1_000_001)).is_err());
}
