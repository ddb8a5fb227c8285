// crates/policy-flow-core/src/core/validation.rs
// ============================================================================
// Module: Policy Flow Validation
// Description: Structural and binding validators for policy documents.
// Purpose: Gate policy creation and execution on well-formed inputs.
// Dependencies: crate::core::{identifiers, policy}, thiserror
// ============================================================================

//! ## Overview
//! Structural validation runs a fixed sequence of checks and stops at the
//! first failure: identifiers, start count, conditional presence, branch
//! completeness, branch targets. Binding validation requires the supplied
//! variable names to equal the declared set exactly. Both validators are pure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use crate::core::identifiers::BlockId;
use crate::core::identifiers::VariableName;
use crate::core::policy::Block;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Branch side of a conditional block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchSide {
    /// Branch taken when the comparison holds.
    True,
    /// Branch taken when the comparison does not hold.
    False,
}

impl BranchSide {
    /// Returns the field name of the branch.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::True => "true_branch",
            Self::False => "false_branch",
        }
    }
}

impl fmt::Display for BranchSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Structural validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A block is missing its identifier or the identifier is not unique.
    #[error("each block must have a unique, non-empty block_id: {reason}")]
    MalformedBlock {
        /// Description of the malformed block.
        reason: String,
    },
    /// The policy does not have exactly one start block.
    #[error("policy must have exactly one start block (found {found})")]
    InvalidStartCount {
        /// Number of start blocks found.
        found: usize,
    },
    /// The policy has no conditional block.
    #[error("policy must have at least one conditional block")]
    MissingConditional,
    /// A conditional block lacks one of its branches.
    #[error("conditional block '{block_id}' must have both 'true_branch' and 'false_branch'")]
    IncompleteBranches {
        /// Offending block identifier.
        block_id: BlockId,
    },
    /// A conditional branch names a block that does not exist.
    #[error(
        "conditional block '{block_id}' has an invalid '{branch}' reference: '{target}' does not \
         exist"
    )]
    DanglingBranchReference {
        /// Offending block identifier.
        block_id: BlockId,
        /// Branch carrying the dangling reference.
        branch: BranchSide,
        /// Missing target identifier.
        target: BlockId,
    },
}

impl ValidationError {
    /// Returns a stable label for the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MalformedBlock {
                ..
            } => "malformed_block",
            Self::InvalidStartCount {
                ..
            } => "invalid_start_count",
            Self::MissingConditional => "missing_conditional",
            Self::IncompleteBranches {
                ..
            } => "incomplete_branches",
            Self::DanglingBranchReference {
                ..
            } => "dangling_branch_reference",
        }
    }
}

/// Binding validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// Declared variables were not supplied.
    #[error("expected variable(s) {} but they were not supplied", quote_names(.names))]
    MissingVariable {
        /// Missing variable names in declaration order.
        names: Vec<VariableName>,
    },
    /// Supplied variables are not declared by the policy.
    #[error("unexpected variable(s) {} supplied", quote_names(.names))]
    UnexpectedVariable {
        /// Unexpected variable names in sorted order.
        names: Vec<VariableName>,
    },
    /// A variable was bound more than once in a single request.
    #[error("variable(s) {} supplied more than once", quote_names(.names))]
    DuplicateVariable {
        /// Repeated variable names in sorted order.
        names: Vec<VariableName>,
    },
}

impl BindingError {
    /// Returns a stable label for the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingVariable {
                ..
            } => "missing_variable",
            Self::UnexpectedVariable {
                ..
            } => "unexpected_variable",
            Self::DuplicateVariable {
                ..
            } => "duplicate_variable",
        }
    }

    /// Returns the variable names carried by the error.
    #[must_use]
    pub fn names(&self) -> &[VariableName] {
        match self {
            Self::MissingVariable {
                names,
            }
            | Self::UnexpectedVariable {
                names,
            }
            | Self::DuplicateVariable {
                names,
            } => names,
        }
    }
}

/// Formats names as a comma-separated, quoted list.
fn quote_names(names: &[VariableName]) -> String {
    names.iter().map(|name| format!("'{name}'")).collect::<Vec<_>>().join(", ")
}

// ============================================================================
// SECTION: Structural Validation
// ============================================================================

/// Validates the structural invariants of a block graph.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered, in check order.
pub fn validate_structure(blocks: &BTreeMap<BlockId, Block>) -> Result<(), ValidationError> {
    ensure_identifiers_present(blocks)?;
    ensure_single_start(blocks)?;
    ensure_conditional_present(blocks)?;
    ensure_branches_complete(blocks)?;
    ensure_branch_targets_exist(blocks)?;
    Ok(())
}

/// Ensures every block identifier is non-empty.
fn ensure_identifiers_present(blocks: &BTreeMap<BlockId, Block>) -> Result<(), ValidationError> {
    if blocks.keys().any(BlockId::is_blank) {
        return Err(ValidationError::MalformedBlock {
            reason: "block_id must not be empty".to_string(),
        });
    }
    Ok(())
}

/// Ensures exactly one start block exists.
fn ensure_single_start(blocks: &BTreeMap<BlockId, Block>) -> Result<(), ValidationError> {
    let found = blocks.values().filter(|block| matches!(block, Block::Start(_))).count();
    if found != 1 {
        return Err(ValidationError::InvalidStartCount {
            found,
        });
    }
    Ok(())
}

/// Ensures at least one conditional block exists.
fn ensure_conditional_present(blocks: &BTreeMap<BlockId, Block>) -> Result<(), ValidationError> {
    if !blocks.values().any(|block| matches!(block, Block::Conditional(_))) {
        return Err(ValidationError::MissingConditional);
    }
    Ok(())
}

/// Ensures every conditional block carries both branches.
fn ensure_branches_complete(blocks: &BTreeMap<BlockId, Block>) -> Result<(), ValidationError> {
    for (block_id, block) in blocks {
        let Block::Conditional(conditional) = block else {
            continue;
        };
        let populated = |branch: Option<&BlockId>| branch.is_some_and(|id| !id.is_blank());
        if !populated(conditional.true_branch.as_ref())
            || !populated(conditional.false_branch.as_ref())
        {
            return Err(ValidationError::IncompleteBranches {
                block_id: block_id.clone(),
            });
        }
    }
    Ok(())
}

/// Ensures every conditional branch names an existing block.
fn ensure_branch_targets_exist(blocks: &BTreeMap<BlockId, Block>) -> Result<(), ValidationError> {
    for (block_id, block) in blocks {
        let Block::Conditional(conditional) = block else {
            continue;
        };
        let branches = [
            (BranchSide::True, conditional.true_branch.as_ref()),
            (BranchSide::False, conditional.false_branch.as_ref()),
        ];
        for (branch, target) in branches {
            if let Some(target) = target
                && !blocks.contains_key(target)
            {
                return Err(ValidationError::DanglingBranchReference {
                    block_id: block_id.clone(),
                    branch,
                    target: target.clone(),
                });
            }
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Binding Validation
// ============================================================================

/// Checks that supplied variable names exactly match the declared variables.
///
/// Missing variables take precedence: when any declared variable is absent,
/// every absent name is reported. Otherwise every undeclared name is reported.
///
/// # Errors
///
/// Returns [`BindingError`] when the two sets differ.
pub fn validate_bindings<I, K>(declared: &[VariableName], supplied: I) -> Result<(), BindingError>
where
    I: IntoIterator<Item = K>,
    K: AsRef<str>,
{
    let supplied: BTreeSet<String> =
        supplied.into_iter().map(|name| name.as_ref().to_string()).collect();

    let mut missing: Vec<VariableName> = Vec::new();
    for name in declared {
        if !supplied.contains(name.as_str()) && !missing.contains(name) {
            missing.push(name.clone());
        }
    }
    if !missing.is_empty() {
        return Err(BindingError::MissingVariable {
            names: missing,
        });
    }

    let unexpected: Vec<VariableName> = supplied
        .iter()
        .filter(|name| !declared.iter().any(|declared| declared.as_str() == name.as_str()))
        .map(|name| VariableName::new(name.as_str()))
        .collect();
    if !unexpected.is_empty() {
        return Err(BindingError::UnexpectedVariable {
            names: unexpected,
        });
    }
    Ok(())
}
