// crates/policy-flow-core/src/runtime/control_plane.rs
// ============================================================================
// Module: Policy Flow Control Plane
// Description: Canonical create/get/list/delete/execute path over a store.
// Purpose: Give every surface (HTTP, CLI) one validated path into the core.
// Dependencies: crate::{core, interfaces, runtime::engine}, thiserror
// ============================================================================

//! ## Overview
//! The control plane is the single canonical execution path for policies. All
//! API surfaces must call into these methods so that validation always runs
//! before persistence and binding checks always run before execution.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::BindingError;
use crate::core::Policy;
use crate::core::PolicyDraft;
use crate::core::PolicyId;
use crate::core::ValidationError;
use crate::interfaces::PolicyStore;
use crate::interfaces::StoreError;
use crate::runtime::engine::ExecutionError;
use crate::runtime::engine::ExecutionLimits;
use crate::runtime::engine::ExecutionOutcome;
use crate::runtime::engine::Executor;
use crate::runtime::engine::RawBindings;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Control plane errors.
#[derive(Debug, Error)]
pub enum ControlPlaneError {
    /// No policy is stored under the identifier.
    #[error("policy not found: {0}")]
    NotFound(PolicyId),
    /// The candidate document is structurally invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The supplied variables do not match the declared set.
    #[error(transparent)]
    Binding(#[from] BindingError),
    /// Traversal failed.
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    /// Policy store error.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ControlPlaneError {
    /// Returns a stable label for the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Validation(err) => err.kind(),
            Self::Binding(err) => err.kind(),
            Self::Execution(err) => err.kind(),
            Self::Store(_) => "store_error",
        }
    }
}

// ============================================================================
// SECTION: Control Plane
// ============================================================================

/// Policy control plane bound to a store.
#[derive(Debug, Clone)]
pub struct PolicyControlPlane<S> {
    /// Backing policy store.
    store: S,
    /// Executor carrying the configured traversal limits.
    executor: Executor,
}

impl<S: PolicyStore> PolicyControlPlane<S> {
    /// Creates a control plane over a store.
    #[must_use]
    pub const fn new(store: S, limits: ExecutionLimits) -> Self {
        Self {
            store,
            executor: Executor::new(limits),
        }
    }

    /// Returns the backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Validates a candidate, assigns a fresh identifier, and stores it.
    ///
    /// # Errors
    ///
    /// Returns [`ControlPlaneError::Validation`] when the candidate is invalid
    /// (nothing is stored) or [`ControlPlaneError::Store`] when saving fails.
    pub fn create(&self, draft: PolicyDraft) -> Result<Policy, ControlPlaneError> {
        let policy = draft.into_policy(PolicyId::generate())?;
        self.store.put(&policy)?;
        Ok(policy)
    }

    /// Loads a stored policy.
    ///
    /// # Errors
    ///
    /// Returns [`ControlPlaneError::NotFound`] for unknown identifiers.
    pub fn get(&self, id: &PolicyId) -> Result<Policy, ControlPlaneError> {
        self.store.get(id)?.ok_or_else(|| ControlPlaneError::NotFound(id.clone()))
    }

    /// Lists stored policy identifiers in ascending order.
    ///
    /// # Errors
    ///
    /// Returns [`ControlPlaneError::Store`] when listing fails.
    pub fn list(&self) -> Result<Vec<PolicyId>, ControlPlaneError> {
        Ok(self.store.list()?)
    }

    /// Deletes a stored policy.
    ///
    /// # Errors
    ///
    /// Returns [`ControlPlaneError::NotFound`] for unknown identifiers.
    pub fn delete(&self, id: &PolicyId) -> Result<(), ControlPlaneError> {
        if self.store.delete(id)? {
            Ok(())
        } else {
            Err(ControlPlaneError::NotFound(id.clone()))
        }
    }

    /// Executes a stored policy against raw bindings.
    ///
    /// # Errors
    ///
    /// Returns [`ControlPlaneError::NotFound`], [`ControlPlaneError::Binding`]
    /// when the supplied names differ from the declared variables, or
    /// [`ControlPlaneError::Execution`] when traversal fails.
    pub fn execute(
        &self,
        id: &PolicyId,
        supplied: &RawBindings,
    ) -> Result<ExecutionOutcome, ControlPlaneError> {
        let policy = self.get(id)?;
        policy.validate_bindings(supplied.keys())?;
        Ok(self.executor.execute_traced(&policy, supplied)?)
    }
}
