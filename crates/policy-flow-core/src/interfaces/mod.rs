// crates/policy-flow-core/src/interfaces/mod.rs
// ============================================================================
// Module: Policy Flow Interfaces
// Description: Backend-agnostic storage contract for policy documents.
// Purpose: Define the persistence surface used by the control plane.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The core never touches a filesystem or network. Persistence integrates
//! through [`PolicyStore`]; implementations must fail closed on corrupted or
//! unreadable data instead of returning partial documents.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::Policy;
use crate::core::PolicyId;

// ============================================================================
// SECTION: Policy Store
// ============================================================================

/// Policy store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("policy store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("policy store corruption: {0}")]
    Corrupt(String),
    /// Store data version is incompatible.
    #[error("policy store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data is invalid.
    #[error("policy store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("policy store error: {0}")]
    Store(String),
}

/// Durable storage for policy documents, keyed by policy identifier.
pub trait PolicyStore {
    /// Loads a policy by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn get(&self, id: &PolicyId) -> Result<Option<Policy>, StoreError>;

    /// Stores a policy under its own identifier, replacing any previous copy.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when saving fails.
    fn put(&self, policy: &Policy) -> Result<(), StoreError>;

    /// Deletes a policy. Returns `false` when no policy had the identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when deletion fails.
    fn delete(&self, id: &PolicyId) -> Result<bool, StoreError>;

    /// Lists stored policy identifiers in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when listing fails.
    fn list(&self) -> Result<Vec<PolicyId>, StoreError>;
}
