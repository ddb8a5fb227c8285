// crates/policy-flow-core/src/runtime/engine.rs
// ============================================================================
// Module: Policy Flow Execution Engine
// Description: Deterministic traversal of a policy graph to a decision.
// Purpose: Turn a validated policy plus raw bindings into a decision value.
// Dependencies: crate::{core, runtime::comparator}, thiserror
// ============================================================================

//! ## Overview
//! Execution coerces raw bindings, enters the graph at the unique start block
//! and follows branches until an end block is reached. Every transition counts
//! against a step limit so cyclic graphs fail instead of looping. Violated
//! structural invariants (possible when a policy bypassed validation) surface
//! as dedicated errors rather than guesses.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use thiserror::Error;

use crate::core::BindingError;
use crate::core::Block;
use crate::core::BlockId;
use crate::core::BranchSide;
use crate::core::ConditionalBlock;
use crate::core::DecisionValue;
use crate::core::Policy;
use crate::core::RuntimeValue;
use crate::core::VariableName;
use crate::core::coerce;
use crate::runtime::comparator::Operator;
use crate::runtime::comparator::evaluate_operator;

// ============================================================================
// SECTION: Bindings
// ============================================================================

/// Raw variable bindings as supplied by a caller.
pub type RawBindings = BTreeMap<String, String>;

/// Collects `(name, value)` pairs into raw bindings.
///
/// # Errors
///
/// Returns [`BindingError::DuplicateVariable`] naming every variable bound
/// more than once.
pub fn collect_bindings<I>(pairs: I) -> Result<RawBindings, BindingError>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut bindings = RawBindings::new();
    let mut repeated = BTreeSet::new();
    for (name, value) in pairs {
        if bindings.contains_key(&name) {
            repeated.insert(name);
        } else {
            bindings.insert(name, value);
        }
    }
    if !repeated.is_empty() {
        return Err(BindingError::DuplicateVariable {
            names: repeated.into_iter().map(VariableName::new).collect(),
        });
    }
    Ok(bindings)
}

/// Coerced variable bindings for a single execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    /// Coerced values keyed by variable name.
    values: BTreeMap<VariableName, RuntimeValue>,
}

impl Bindings {
    /// Coerces every raw value independently.
    #[must_use]
    pub fn from_raw(raw: &RawBindings) -> Self {
        let values = raw
            .iter()
            .map(|(name, value)| (VariableName::new(name.as_str()), coerce(value)))
            .collect();
        Self {
            values,
        }
    }

    /// Returns the coerced value bound to a variable.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RuntimeValue> {
        self.values.get(name)
    }

    /// Returns the number of bound variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true when no variables are bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ============================================================================
// SECTION: Limits and Outcomes
// ============================================================================

/// Traversal limits applied by the executor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionLimits {
    /// Explicit maximum number of transitions; defaults to the block count.
    pub max_steps: Option<usize>,
}

impl ExecutionLimits {
    /// Returns the step limit applied to the policy.
    #[must_use]
    pub fn step_limit(&self, policy: &Policy) -> usize {
        self.max_steps.unwrap_or(policy.blocks.len())
    }
}

/// Result of a successful execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Decision value of the end block reached.
    pub decision: DecisionValue,
    /// Visited block identifiers, start block first.
    pub path: Vec<BlockId>,
    /// Number of transitions taken.
    pub steps: usize,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Execution-time errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// The policy does not have exactly one start block.
    #[error("policy must have exactly one start block to execute (found {found})")]
    InvalidStartCount {
        /// Number of start blocks found.
        found: usize,
    },
    /// A referenced block identifier does not resolve.
    #[error("block '{from}' references undefined block '{target}'")]
    UndefinedBlockReference {
        /// Block holding the reference.
        from: BlockId,
        /// Unresolved identifier.
        target: BlockId,
    },
    /// A conditional block uses an operator outside the supported set.
    #[error("conditional block '{block_id}' uses unsupported operator '{operator}'")]
    UnsupportedOperator {
        /// Offending block identifier.
        block_id: BlockId,
        /// Operator token as stored.
        operator: String,
    },
    /// The operands cannot be ordered by the operator.
    #[error(
        "conditional block '{block_id}' cannot compare {left_type} with {right_type} using \
         '{operator}'"
    )]
    IncomparableOperands {
        /// Offending block identifier.
        block_id: BlockId,
        /// Operator applied.
        operator: Operator,
        /// Type of the bound variable value.
        left_type: &'static str,
        /// Type of the comparison literal.
        right_type: &'static str,
    },
    /// The traversal did not reach an end block within the step limit.
    #[error("traversal exceeded the step limit of {limit}")]
    TraversalStepLimitExceeded {
        /// Step limit that was exceeded.
        limit: usize,
    },
    /// A start block was reached after traversal began.
    #[error("start block '{block_id}' reached during traversal")]
    StartBlockReentered {
        /// Start block identifier.
        block_id: BlockId,
    },
    /// A block with an unrecognized type was reached.
    #[error("block '{block_id}' has an unsupported block type")]
    UnsupportedBlockType {
        /// Offending block identifier.
        block_id: BlockId,
    },
    /// A conditional block compares a variable with no binding.
    #[error("conditional block '{block_id}' references unbound variable '{variable}'")]
    UnboundVariable {
        /// Offending block identifier.
        block_id: BlockId,
        /// Variable without a binding.
        variable: VariableName,
    },
    /// A conditional block lacks the branch selected by its comparison.
    #[error("conditional block '{block_id}' has no '{branch}'")]
    MissingBranch {
        /// Offending block identifier.
        block_id: BlockId,
        /// Selected branch.
        branch: BranchSide,
    },
}

impl ExecutionError {
    /// Returns a stable label for the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidStartCount {
                ..
            } => "invalid_start_count",
            Self::UndefinedBlockReference {
                ..
            } => "undefined_block_reference",
            Self::UnsupportedOperator {
                ..
            } => "unsupported_operator",
            Self::IncomparableOperands {
                ..
            } => "incomparable_operands",
            Self::TraversalStepLimitExceeded {
                ..
            } => "traversal_step_limit_exceeded",
            Self::StartBlockReentered {
                ..
            } => "start_block_reentered",
            Self::UnsupportedBlockType {
                ..
            } => "unsupported_block_type",
            Self::UnboundVariable {
                ..
            } => "unbound_variable",
            Self::MissingBranch {
                ..
            } => "missing_branch",
        }
    }
}

// ============================================================================
// SECTION: Executor
// ============================================================================

/// Policy executor with configured traversal limits.
#[derive(Debug, Clone, Copy, Default)]
pub struct Executor {
    /// Traversal limits.
    limits: ExecutionLimits,
}

impl Executor {
    /// Creates an executor with explicit limits.
    #[must_use]
    pub const fn new(limits: ExecutionLimits) -> Self {
        Self {
            limits,
        }
    }

    /// Returns the configured limits.
    #[must_use]
    pub const fn limits(&self) -> ExecutionLimits {
        self.limits
    }

    /// Executes a policy and returns the decision value.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError`] when traversal cannot reach an end block.
    pub fn execute(
        &self,
        policy: &Policy,
        supplied: &RawBindings,
    ) -> Result<DecisionValue, ExecutionError> {
        self.execute_traced(policy, supplied).map(|outcome| outcome.decision)
    }

    /// Executes a policy and returns the decision with its traversal trace.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError`] when traversal cannot reach an end block.
    pub fn execute_traced(
        &self,
        policy: &Policy,
        supplied: &RawBindings,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let bindings = Bindings::from_raw(supplied);
        let limit = self.limits.step_limit(policy);
        let (start_id, start_next) = find_start(policy)?;

        let mut path = vec![start_id.clone()];
        let mut from = start_id;
        let mut target = start_next;
        let mut steps = 0usize;
        loop {
            steps += 1;
            if steps > limit {
                return Err(ExecutionError::TraversalStepLimitExceeded {
                    limit,
                });
            }
            let Some(block) = policy.block(&target) else {
                return Err(ExecutionError::UndefinedBlockReference {
                    from,
                    target,
                });
            };
            path.push(target.clone());
            match block {
                Block::End(end) => {
                    return Ok(ExecutionOutcome {
                        decision: end.decision_value.clone(),
                        path,
                        steps,
                    });
                }
                Block::Conditional(conditional) => {
                    let next = evaluate_conditional(&target, conditional, &bindings)?;
                    from = target;
                    target = next;
                }
                Block::Start(_) => {
                    return Err(ExecutionError::StartBlockReentered {
                        block_id: target,
                    });
                }
                Block::Unrecognized(_) => {
                    return Err(ExecutionError::UnsupportedBlockType {
                        block_id: target,
                    });
                }
            }
        }
    }
}

/// Executes a policy with default limits.
///
/// # Errors
///
/// Returns [`ExecutionError`] when traversal cannot reach an end block.
pub fn execute(policy: &Policy, supplied: &RawBindings) -> Result<DecisionValue, ExecutionError> {
    Executor::default().execute(policy, supplied)
}

// ============================================================================
// SECTION: Traversal Helpers
// ============================================================================

/// Locates the unique start block and its successor.
fn find_start(policy: &Policy) -> Result<(BlockId, BlockId), ExecutionError> {
    let mut starts = policy.blocks.iter().filter_map(|(id, block)| match block {
        Block::Start(start) => Some((id, start)),
        _ => None,
    });
    match (starts.next(), starts.next()) {
        (Some((id, start)), None) => Ok((id.clone(), start.next_block.clone())),
        (None, _) => Err(ExecutionError::InvalidStartCount {
            found: 0,
        }),
        (Some(_), Some(_)) => Err(ExecutionError::InvalidStartCount {
            found: 2 + starts.count(),
        }),
    }
}

/// Evaluates a conditional block and returns the selected branch target.
fn evaluate_conditional(
    block_id: &BlockId,
    conditional: &ConditionalBlock,
    bindings: &Bindings,
) -> Result<BlockId, ExecutionError> {
    let Some(left) = bindings.get(conditional.variable.as_str()) else {
        return Err(ExecutionError::UnboundVariable {
            block_id: block_id.clone(),
            variable: conditional.variable.clone(),
        });
    };
    let Some(operator) = Operator::parse(&conditional.operator) else {
        return Err(ExecutionError::UnsupportedOperator {
            block_id: block_id.clone(),
            operator: conditional.operator.clone(),
        });
    };
    let right = coerce(&conditional.cmp_value);
    let Some(holds) = evaluate_operator(operator, left, &right) else {
        return Err(ExecutionError::IncomparableOperands {
            block_id: block_id.clone(),
            operator,
            left_type: left.type_name(),
            right_type: right.type_name(),
        });
    };
    let (branch, target) = if holds {
        (BranchSide::True, conditional.true_branch.as_ref())
    } else {
        (BranchSide::False, conditional.false_branch.as_ref())
    };
    target.cloned().ok_or_else(|| ExecutionError::MissingBranch {
        block_id: block_id.clone(),
        branch,
    })
}
