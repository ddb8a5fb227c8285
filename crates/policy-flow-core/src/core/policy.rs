// crates/policy-flow-core/src/core/policy.rs
// ============================================================================
// Module: Policy Flow Policy Documents
// Description: Policy, block, and candidate document definitions.
// Purpose: Define the canonical policy graph with validation entry points.
// Dependencies: crate::core::{hashing, identifiers, validation}, serde, serde_json
// ============================================================================

//! ## Overview
//! A policy is a named graph of blocks keyed by block identifier. Branches are
//! identifier references resolved by lookup at traversal time, never owning
//! edges. Candidate documents submitted for creation may carry their blocks
//! either keyed by identifier or as a list of blocks with a `block_id` field;
//! both forms normalize to the keyed mapping before validation completes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de;
use serde::ser;
use serde_json::Map;
use serde_json::Value;

use crate::core::hashing::HashAlgorithm;
use crate::core::hashing::HashDigest;
use crate::core::hashing::HashError;
use crate::core::hashing::hash_canonical_json;
use crate::core::identifiers::BlockId;
use crate::core::identifiers::PolicyId;
use crate::core::identifiers::VariableName;
use crate::core::validation::BindingError;
use crate::core::validation::ValidationError;
use crate::core::validation::validate_bindings;
use crate::core::validation::validate_structure;

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Stored policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Identifier assigned at creation time.
    pub id: PolicyId,
    /// Display label.
    pub name: String,
    /// Declared runtime variables, in submission order.
    pub variables: Vec<VariableName>,
    /// Block graph keyed by block identifier.
    pub blocks: BTreeMap<BlockId, Block>,
}

impl Policy {
    /// Validates the structural invariants of the block graph.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] describing the first violated invariant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_structure(&self.blocks)
    }

    /// Checks that the supplied variable names exactly match the declared set.
    ///
    /// # Errors
    ///
    /// Returns [`BindingError`] when variables are missing or unexpected.
    pub fn validate_bindings<I, K>(&self, supplied: I) -> Result<(), BindingError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        validate_bindings(&self.variables, supplied)
    }

    /// Returns the block stored under the identifier, if any.
    #[must_use]
    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.get(id)
    }

    /// Computes the canonical hash of the policy document.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::Canonicalization`] when serialization fails.
    pub fn canonical_hash_with(&self, algorithm: HashAlgorithm) -> Result<HashDigest, HashError> {
        hash_canonical_json(algorithm, self)
    }
}

// ============================================================================
// SECTION: Candidate Documents
// ============================================================================

/// Candidate policy submitted for creation (no identifier yet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDraft {
    /// Display label.
    pub name: String,
    /// Declared runtime variables.
    pub variables: Vec<VariableName>,
    /// Blocks in keyed or listed form.
    pub blocks: BlockSet,
}

impl PolicyDraft {
    /// Validates the candidate without consuming it.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] describing the first violated invariant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let blocks = self.blocks.clone().into_keyed()?;
        validate_structure(&blocks)
    }

    /// Validates the candidate and turns it into a policy with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] describing the first violated invariant.
    pub fn into_policy(self, id: PolicyId) -> Result<Policy, ValidationError> {
        let blocks = self.blocks.into_keyed()?;
        validate_structure(&blocks)?;
        Ok(Policy {
            id,
            name: self.name,
            variables: self.variables,
            blocks,
        })
    }
}

/// Block collection as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockSet {
    /// Blocks keyed by identifier: `{"1": {...}, "2": {...}}`.
    Keyed(BTreeMap<BlockId, Block>),
    /// Blocks as a list, each carrying its own `block_id`.
    Listed(Vec<ListedBlock>),
}

impl BlockSet {
    /// Normalizes the collection into a mapping keyed by block identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedBlock`] when a listed block has no
    /// identifier or an identifier appears more than once.
    pub fn into_keyed(self) -> Result<BTreeMap<BlockId, Block>, ValidationError> {
        match self {
            Self::Keyed(blocks) => Ok(blocks),
            Self::Listed(list) => {
                let mut blocks = BTreeMap::new();
                for (position, listed) in list.into_iter().enumerate() {
                    let Some(block_id) = listed.block_id else {
                        return Err(ValidationError::MalformedBlock {
                            reason: format!("block at position {position} is missing a block_id"),
                        });
                    };
                    if blocks.contains_key(&block_id) {
                        return Err(ValidationError::MalformedBlock {
                            reason: format!("duplicate block_id '{block_id}'"),
                        });
                    }
                    blocks.insert(block_id, listed.block);
                }
                Ok(blocks)
            }
        }
    }
}

impl From<BTreeMap<BlockId, Block>> for BlockSet {
    fn from(blocks: BTreeMap<BlockId, Block>) -> Self {
        Self::Keyed(blocks)
    }
}

/// Block entry in the listed form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedBlock {
    /// Block identifier; absent identifiers are rejected during validation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_id: Option<BlockId>,
    /// Block payload.
    #[serde(flatten)]
    pub block: Block,
}

// ============================================================================
// SECTION: Blocks
// ============================================================================

/// Policy graph node, discriminated by `block_type`.
///
/// Blocks with a type tag this engine does not know are kept verbatim so a
/// stored policy always reproduces the submitted document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Entry point of the traversal.
    Start(StartBlock),
    /// Decision point with a true and a false branch.
    Conditional(ConditionalBlock),
    /// Terminal block carrying the decision value.
    End(EndBlock),
    /// Block with a type tag this engine does not know.
    Unrecognized(UnrecognizedBlock),
}

impl Block {
    /// Returns the wire label of the block type.
    #[must_use]
    pub fn type_label(&self) -> &str {
        match self {
            Self::Start(_) => START_BLOCK_TAG,
            Self::Conditional(_) => CONDITIONAL_BLOCK_TAG,
            Self::End(_) => END_BLOCK_TAG,
            Self::Unrecognized(block) => block.block_type(),
        }
    }
}

/// Wire tag of start blocks.
const START_BLOCK_TAG: &str = "StartBlock";
/// Wire tag of conditional blocks.
const CONDITIONAL_BLOCK_TAG: &str = "ConditionalBlock";
/// Wire tag of end blocks.
const END_BLOCK_TAG: &str = "EndBlock";
/// Field carrying the block type tag.
const BLOCK_TYPE_FIELD: &str = "block_type";

impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = match self {
            Self::Start(block) => tagged_fields(START_BLOCK_TAG, block),
            Self::Conditional(block) => tagged_fields(CONDITIONAL_BLOCK_TAG, block),
            Self::End(block) => tagged_fields(END_BLOCK_TAG, block),
            Self::Unrecognized(block) => return block.fields.serialize(serializer),
        }
        .map_err(<S::Error as ser::Error>::custom)?;
        fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = Map::<String, Value>::deserialize(deserializer)?;
        let tag = match fields.get(BLOCK_TYPE_FIELD) {
            Some(Value::String(tag)) => tag.clone(),
            Some(_) => return Err(de::Error::custom("block_type must be a string")),
            None => return Err(de::Error::missing_field(BLOCK_TYPE_FIELD)),
        };
        let block = match tag.as_str() {
            START_BLOCK_TAG => serde_json::from_value(Value::Object(fields)).map(Self::Start),
            CONDITIONAL_BLOCK_TAG => {
                serde_json::from_value(Value::Object(fields)).map(Self::Conditional)
            }
            END_BLOCK_TAG => serde_json::from_value(Value::Object(fields)).map(Self::End),
            _ => Ok(Self::Unrecognized(UnrecognizedBlock {
                fields,
            })),
        };
        block.map_err(de::Error::custom)
    }
}

/// Serializes a known block payload and adds its type tag.
fn tagged_fields<T: Serialize>(
    tag: &str,
    payload: &T,
) -> Result<Map<String, Value>, serde_json::Error> {
    let Value::Object(mut fields) = serde_json::to_value(payload)? else {
        return Err(ser::Error::custom("block payload must serialize as an object"));
    };
    fields.insert(BLOCK_TYPE_FIELD.to_string(), Value::String(tag.to_string()));
    Ok(fields)
}

/// Block of an unknown type, kept exactly as submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnrecognizedBlock {
    /// Every submitted field, `block_type` included.
    fields: Map<String, Value>,
}

impl UnrecognizedBlock {
    /// Returns the submitted type tag.
    #[must_use]
    pub fn block_type(&self) -> &str {
        self.fields.get(BLOCK_TYPE_FIELD).and_then(Value::as_str).unwrap_or_default()
    }

    /// Returns the submitted fields.
    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Start block payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartBlock {
    /// First block executed after the start.
    pub next_block: BlockId,
}

/// Conditional block payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalBlock {
    /// Variable compared by this block.
    pub variable: VariableName,
    /// Comparison operator token (`=`, `!=`, `>`, `<`, `>=`, `<=`).
    pub operator: String,
    /// Literal compared against, coerced at evaluation time.
    pub cmp_value: String,
    /// Target when the comparison holds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub true_branch: Option<BlockId>,
    /// Target when the comparison does not hold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub false_branch: Option<BlockId>,
}

/// End block payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndBlock {
    /// Terminal decision returned to the caller.
    pub decision_value: DecisionValue,
}

/// Terminal decision produced by an execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionValue(String);

impl DecisionValue {
    /// Creates a decision value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the decision as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DecisionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for DecisionValue {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
