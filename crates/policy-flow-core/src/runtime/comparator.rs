// crates/policy-flow-core/src/runtime/comparator.rs
// ============================================================================
// Module: Policy Flow Comparator Logic
// Description: Operator parsing and evaluation over coerced runtime values.
// Purpose: Decide which branch a conditional block takes.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Equality operators compare structurally: numbers by exact value (an
//! integer equals a float of the same value, with no precision lost to
//! widening), text by exact content, and a number never equals text. Ordering operators are only defined when both operands
//! are numeric; any other pairing is incomparable and yields `None`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::fmt;

use crate::core::RuntimeValue;

// ============================================================================
// SECTION: Operators
// ============================================================================

/// Comparison operator used by conditional blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `=`
    Equals,
    /// `!=`
    NotEquals,
    /// `>`
    GreaterThan,
    /// `<`
    LessThan,
    /// `>=`
    GreaterThanOrEqual,
    /// `<=`
    LessThanOrEqual,
}

impl Operator {
    /// Parses an operator token. Returns `None` for unsupported tokens.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "=" => Some(Self::Equals),
            "!=" => Some(Self::NotEquals),
            ">" => Some(Self::GreaterThan),
            "<" => Some(Self::LessThan),
            ">=" => Some(Self::GreaterThanOrEqual),
            "<=" => Some(Self::LessThanOrEqual),
            _ => None,
        }
    }

    /// Returns the operator token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::NotEquals => "!=",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThanOrEqual => "<=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

/// Evaluates `left <operator> right`.
///
/// Returns `None` when the operands cannot be compared with the operator.
#[must_use]
pub fn evaluate_operator(
    operator: Operator,
    left: &RuntimeValue,
    right: &RuntimeValue,
) -> Option<bool> {
    match operator {
        Operator::Equals => Some(values_equal(left, right)),
        Operator::NotEquals => Some(!values_equal(left, right)),
        Operator::GreaterThan => numeric_cmp(left, right).map(Ordering::is_gt),
        Operator::LessThan => numeric_cmp(left, right).map(Ordering::is_lt),
        Operator::GreaterThanOrEqual => numeric_cmp(left, right).map(Ordering::is_ge),
        Operator::LessThanOrEqual => numeric_cmp(left, right).map(Ordering::is_le),
    }
}

/// Structural equality across runtime values.
fn values_equal(left: &RuntimeValue, right: &RuntimeValue) -> bool {
    match (left, right) {
        (RuntimeValue::Text(left), RuntimeValue::Text(right)) => left == right,
        (RuntimeValue::Text(_), _) | (_, RuntimeValue::Text(_)) => false,
        _ => numeric_cmp(left, right).is_some_and(Ordering::is_eq),
    }
}

/// Orders two numeric values; `None` when either side is text or NaN.
fn numeric_cmp(left: &RuntimeValue, right: &RuntimeValue) -> Option<Ordering> {
    match (left, right) {
        (RuntimeValue::Integer(left), RuntimeValue::Integer(right)) => Some(left.cmp(right)),
        (RuntimeValue::Float(left), RuntimeValue::Float(right)) => left.partial_cmp(right),
        (RuntimeValue::Integer(left), RuntimeValue::Float(right)) => int_float_cmp(*left, *right),
        (RuntimeValue::Float(left), RuntimeValue::Integer(right)) => {
            int_float_cmp(*right, *left).map(Ordering::reverse)
        }
        _ => None,
    }
}

/// Lower bound of `i64` as a float (exactly `-2^63`).
const I64_MIN_AS_FLOAT: f64 = -9_223_372_036_854_775_808.0;

/// Orders an integer against a float exactly, without widening the integer.
fn int_float_cmp(int: i64, float: f64) -> Option<Ordering> {
    if float.is_nan() {
        return None;
    }
    if float >= -I64_MIN_AS_FLOAT {
        return Some(Ordering::Less);
    }
    if float < I64_MIN_AS_FLOAT {
        return Some(Ordering::Greater);
    }
    match int.cmp(&float_whole_part(float)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&float.fract()),
        ordering => Some(ordering),
    }
}

/// Truncates a float known to lie within the `i64` range.
#[allow(clippy::cast_possible_truncation, reason = "Callers bound the value to the i64 range.")]
fn float_whole_part(float: f64) -> i64 {
    float.trunc() as i64
}
