// crates/policy-flow-core/tests/engine.rs
// ============================================================================
// Module: Execution Engine Tests
// Description: End-to-end traversal and defensive execution errors.
// Purpose: Ensure execution reaches the right decision or fails explicitly.
// Dependencies: policy-flow-core, serde_json
// ============================================================================
//! ## Overview
//! Covers the age-gate scenarios, cyclic graphs bounded by the step limit,
//! and the defensive errors raised for graphs that bypassed validation.

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

use policy_flow_core::BlockId;
use policy_flow_core::BranchSide;
use policy_flow_core::DecisionValue;
use policy_flow_core::ExecutionError;
use policy_flow_core::ExecutionLimits;
use policy_flow_core::Executor;
use policy_flow_core::Operator;
use policy_flow_core::Policy;
use policy_flow_core::RawBindings;
use policy_flow_core::VariableName;
use policy_flow_core::execute;
use serde_json::Value;
use serde_json::json;

fn policy(value: Value) -> Policy {
    serde_json::from_value(value).expect("policy json")
}

fn age_gate() -> Policy {
    policy(json!({
        "id": "age-gate",
        "name": "age gate",
        "variables": ["age"],
        "blocks": {
            "1": {"block_type": "StartBlock", "next_block": "2"},
            "2": {"block_type": "ConditionalBlock", "variable": "age", "operator": ">=",
                  "cmp_value": "18", "true_branch": "3", "false_branch": "4"},
            "3": {"block_type": "EndBlock", "decision_value": "Approved"},
            "4": {"block_type": "EndBlock", "decision_value": "Denied"}
        }
    }))
}

fn single_conditional(variable: &str, operator: &str, cmp_value: &str) -> Policy {
    policy(json!({
        "id": "single",
        "name": "single",
        "variables": [variable],
        "blocks": {
            "start": {"block_type": "StartBlock", "next_block": "check"},
            "check": {"block_type": "ConditionalBlock", "variable": variable,
                      "operator": operator, "cmp_value": cmp_value,
                      "true_branch": "yes", "false_branch": "no"},
            "yes": {"block_type": "EndBlock", "decision_value": "yes"},
            "no": {"block_type": "EndBlock", "decision_value": "no"}
        }
    }))
}

fn bindings(pairs: &[(&str, &str)]) -> RawBindings {
    pairs.iter().map(|(name, value)| ((*name).to_string(), (*value).to_string())).collect()
}

// ============================================================================
// SECTION: Decisions
// ============================================================================

/// Verifies the age gate approves adults and denies minors.
#[test]
fn age_gate_reaches_both_decisions() {
    let policy = age_gate();
    policy.validate().unwrap();
    assert_eq!(execute(&policy, &bindings(&[("age", "25")])), Ok(DecisionValue::new("Approved")));
    assert_eq!(execute(&policy, &bindings(&[("age", "10")])), Ok(DecisionValue::new("Denied")));
    assert_eq!(execute(&policy, &bindings(&[("age", "18")])), Ok(DecisionValue::new("Approved")));
}

/// Verifies the traced outcome records the visited path.
#[test]
fn traced_execution_records_path() {
    let outcome = Executor::default().execute_traced(&age_gate(), &bindings(&[("age", "17.9")]));
    let outcome = outcome.unwrap();
    assert_eq!(outcome.decision.as_str(), "Denied");
    assert_eq!(outcome.path, vec![BlockId::new("1"), BlockId::new("2"), BlockId::new("4")]);
    assert_eq!(outcome.steps, 2);
}

/// Verifies each operator against integer operands.
#[test]
fn operators_select_expected_branch() {
    let cases = [
        ("=", "5", "yes"),
        ("=", "6", "no"),
        ("!=", "6", "yes"),
        (">", "4", "yes"),
        (">", "5", "no"),
        ("<", "6", "yes"),
        (">=", "5", "yes"),
        ("<=", "4", "no"),
    ];
    for (operator, cmp_value, expected) in cases {
        let policy = single_conditional("n", operator, cmp_value);
        let decision = execute(&policy, &bindings(&[("n", "5")])).unwrap();
        assert_eq!(decision.as_str(), expected, "n {operator} {cmp_value}");
    }
}

/// Verifies text equality routes on exact content.
#[test]
fn text_equality_routes() {
    let policy = single_conditional("tier", "=", "gold");
    assert_eq!(execute(&policy, &bindings(&[("tier", "gold")])).unwrap().as_str(), "yes");
    assert_eq!(execute(&policy, &bindings(&[("tier", "silver")])).unwrap().as_str(), "no");
    assert_eq!(execute(&policy, &bindings(&[("tier", "18")])).unwrap().as_str(), "no");
}

/// Verifies execution leaves the policy untouched.
#[test]
fn execution_does_not_mutate_policy() {
    let policy = age_gate();
    let snapshot = policy.clone();
    let _ = execute(&policy, &bindings(&[("age", "30")]));
    assert_eq!(policy, snapshot);
}

// ============================================================================
// SECTION: Execution Errors
// ============================================================================

/// Verifies ordering text against a number is incomparable.
#[test]
fn text_ordered_against_number_is_incomparable() {
    let policy = single_conditional("name", ">", "10");
    let err = execute(&policy, &bindings(&[("name", "alice")])).unwrap_err();
    assert_eq!(
        err,
        ExecutionError::IncomparableOperands {
            block_id: BlockId::new("check"),
            operator: Operator::GreaterThan,
            left_type: "text",
            right_type: "integer",
        }
    );
    assert_eq!(err.kind(), "incomparable_operands");
}

/// Verifies unknown operators fail at execution time.
#[test]
fn unsupported_operator_is_reported() {
    let policy = single_conditional("n", "==", "5");
    policy.validate().unwrap();
    let err = execute(&policy, &bindings(&[("n", "5")])).unwrap_err();
    assert_eq!(
        err,
        ExecutionError::UnsupportedOperator {
            block_id: BlockId::new("check"),
            operator: "==".to_string(),
        }
    );
}

/// Verifies cycles are stopped by the default step limit.
#[test]
fn cyclic_graph_exceeds_step_limit() {
    let policy = policy(json!({
        "id": "loop",
        "name": "loop",
        "variables": ["n"],
        "blocks": {
            "1": {"block_type": "StartBlock", "next_block": "2"},
            "2": {"block_type": "ConditionalBlock", "variable": "n", "operator": "=",
                  "cmp_value": "1", "true_branch": "3", "false_branch": "4"},
            "3": {"block_type": "ConditionalBlock", "variable": "n", "operator": "=",
                  "cmp_value": "1", "true_branch": "2", "false_branch": "4"},
            "4": {"block_type": "EndBlock", "decision_value": "out"}
        }
    }));
    policy.validate().unwrap();
    let err = execute(&policy, &bindings(&[("n", "1")])).unwrap_err();
    assert_eq!(
        err,
        ExecutionError::TraversalStepLimitExceeded {
            limit: 4
        }
    );
    assert_eq!(execute(&policy, &bindings(&[("n", "2")])).unwrap().as_str(), "out");
}

/// Verifies an explicit step limit overrides the block-count default.
#[test]
fn explicit_step_limit_applies() {
    let tight = Executor::new(ExecutionLimits {
        max_steps: Some(1),
    });
    let err = tight.execute(&age_gate(), &bindings(&[("age", "25")])).unwrap_err();
    assert_eq!(
        err,
        ExecutionError::TraversalStepLimitExceeded {
            limit: 1
        }
    );
    assert_eq!(tight.limits().step_limit(&age_gate()), 1);
    assert_eq!(ExecutionLimits::default().step_limit(&age_gate()), 4);
}

/// Verifies a start block pointing nowhere is reported.
#[test]
fn undefined_start_target_is_reported() {
    let mut policy = age_gate();
    let start = serde_json::from_value(json!({"block_type": "StartBlock", "next_block": "missing"}));
    policy.blocks.insert(BlockId::new("1"), start.unwrap());
    let err = execute(&policy, &bindings(&[("age", "25")])).unwrap_err();
    assert_eq!(
        err,
        ExecutionError::UndefinedBlockReference {
            from: BlockId::new("1"),
            target: BlockId::new("missing"),
        }
    );
}

/// Verifies defensive errors for graphs that bypassed validation.
#[test]
fn unvalidated_graphs_fail_explicitly() {
    let no_start = policy(json!({
        "id": "p", "name": "p", "variables": [],
        "blocks": {"3": {"block_type": "EndBlock", "decision_value": "x"}}
    }));
    assert_eq!(
        execute(&no_start, &RawBindings::new()).unwrap_err(),
        ExecutionError::InvalidStartCount {
            found: 0
        }
    );

    let reentry = policy(json!({
        "id": "p", "name": "p", "variables": [],
        "blocks": {"1": {"block_type": "StartBlock", "next_block": "1"}}
    }));
    assert_eq!(execute(&reentry, &RawBindings::new()).unwrap_err().kind(), "start_block_reentered");

    let unknown = policy(json!({
        "id": "p", "name": "p", "variables": [],
        "blocks": {
            "1": {"block_type": "StartBlock", "next_block": "2"},
            "2": {"block_type": "LoopBlock", "times": 3}
        }
    }));
    assert_eq!(
        execute(&unknown, &RawBindings::new()).unwrap_err(),
        ExecutionError::UnsupportedBlockType {
            block_id: BlockId::new("2")
        }
    );

    let half = policy(json!({
        "id": "p", "name": "p", "variables": ["n"],
        "blocks": {
            "1": {"block_type": "StartBlock", "next_block": "2"},
            "2": {"block_type": "ConditionalBlock", "variable": "n", "operator": "=",
                  "cmp_value": "1", "true_branch": "3"},
            "3": {"block_type": "EndBlock", "decision_value": "x"}
        }
    }));
    assert_eq!(
        execute(&half, &bindings(&[("n", "2")])).unwrap_err(),
        ExecutionError::MissingBranch {
            block_id: BlockId::new("2"),
            branch: BranchSide::False,
        }
    );
    assert_eq!(execute(&half, &bindings(&[("n", "1")])).unwrap().as_str(), "x");
}

/// Verifies a conditional on an unbound variable fails.
#[test]
fn unbound_variable_is_reported() {
    let policy = single_conditional("n", "=", "1");
    let err = execute(&policy, &bindings(&[("m", "1")])).unwrap_err();
    assert_eq!(
        err,
        ExecutionError::UnboundVariable {
            block_id: BlockId::new("check"),
            variable: VariableName::new("n"),
        }
    );
}
