// crates/policy-flow-core/src/core/mod.rs
// ============================================================================
// Module: Policy Flow Core Types
// Description: Canonical policy documents, identifiers, and validation.
// Purpose: Provide stable, serializable types for policy graphs.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Core types define policy documents, their block graph, runtime values, and
//! the structural and binding validators. These types are the canonical source
//! of truth for every derived surface (HTTP, CLI, storage).

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod hashing;
pub mod identifiers;
pub mod policy;
pub mod validation;
pub mod value;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use hashing::HashError;
pub use identifiers::BlockId;
pub use identifiers::PolicyId;
pub use identifiers::VariableName;
pub use policy::Block;
pub use policy::BlockSet;
pub use policy::ConditionalBlock;
pub use policy::DecisionValue;
pub use policy::EndBlock;
pub use policy::ListedBlock;
pub use policy::Policy;
pub use policy::PolicyDraft;
pub use policy::StartBlock;
pub use policy::UnrecognizedBlock;
pub use validation::BindingError;
pub use validation::BranchSide;
pub use validation::ValidationError;
pub use validation::validate_bindings;
pub use validation::validate_structure;
pub use value::RuntimeValue;
pub use value::coerce;
