// crates/policy-flow-core/src/core/value.rs
// ============================================================================
// Module: Policy Flow Runtime Values
// Description: Typed runtime values and the text coercion heuristic.
// Purpose: Turn raw text inputs into comparable numbers or text.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Raw bindings and comparison literals arrive as text. Coercion sniffs the
//! text: anything containing a decimal point is tried as a float, anything made
//! solely of ASCII digits is tried as an integer, and everything else (or a
//! failed parse) stays text. This is a narrow heuristic: integer signs,
//! exponent-only forms, surrounding whitespace, and locale separators are not
//! recognized.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Serialize;

// ============================================================================
// SECTION: Runtime Value
// ============================================================================

/// Coerced runtime value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RuntimeValue {
    /// Whole number parsed from an all-digit string.
    Integer(i64),
    /// Floating-point number parsed from a string with a decimal point.
    Float(f64),
    /// Text kept unchanged.
    Text(String),
}

impl RuntimeValue {
    /// Returns the label of the value type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
        }
    }

    /// Returns true for integer and float values.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Float(_))
    }
}

impl fmt::Display for RuntimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => value.fmt(f),
            Self::Float(value) => value.fmt(f),
            Self::Text(value) => value.fmt(f),
        }
    }
}

// ============================================================================
// SECTION: Coercion
// ============================================================================

/// Coerces raw text into a runtime value.
#[must_use]
pub fn coerce(raw: &str) -> RuntimeValue {
    if raw.contains('.') {
        if let Ok(value) = raw.parse::<f64>() {
            return RuntimeValue::Float(value);
        }
    } else if is_ascii_digits(raw)
        && let Ok(value) = raw.parse::<i64>()
    {
        return RuntimeValue::Integer(value);
    }
    RuntimeValue::Text(raw.to_string())
}

/// Returns true when the text is non-empty and made only of ASCII digits.
fn is_ascii_digits(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|byte| byte.is_ascii_digit())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
