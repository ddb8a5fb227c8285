// crates/policy-flow-core/src/runtime/store.rs
// ============================================================================
// Module: Policy Flow In-Memory Store
// Description: In-memory policy store and shared store wrapper.
// Purpose: Provide a deterministic store implementation without external deps.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryPolicyStore`] keeps policies in a mutex-guarded ordered map and
//! loses them on restart. [`SharedPolicyStore`] lets callers pick a backend at
//! runtime while the control plane stays generic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::Policy;
use crate::core::PolicyId;
use crate::interfaces::PolicyStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory policy store for tests and local use.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPolicyStore {
    /// Policy map protected by a mutex.
    policies: Arc<Mutex<BTreeMap<PolicyId, Policy>>>,
}

impl InMemoryPolicyStore {
    /// Creates an empty in-memory policy store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            policies: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }
}

impl PolicyStore for InMemoryPolicyStore {
    fn get(&self, id: &PolicyId) -> Result<Option<Policy>, StoreError> {
        let guard = self.policies.lock().map_err(|_| poisoned())?;
        Ok(guard.get(id).cloned())
    }

    fn put(&self, policy: &Policy) -> Result<(), StoreError> {
        self.policies.lock().map_err(|_| poisoned())?.insert(policy.id.clone(), policy.clone());
        Ok(())
    }

    fn delete(&self, id: &PolicyId) -> Result<bool, StoreError> {
        Ok(self.policies.lock().map_err(|_| poisoned())?.remove(id).is_some())
    }

    fn list(&self) -> Result<Vec<PolicyId>, StoreError> {
        let guard = self.policies.lock().map_err(|_| poisoned())?;
        Ok(guard.keys().cloned().collect())
    }
}

/// Error returned when the store mutex was poisoned by a panicking writer.
fn poisoned() -> StoreError {
    StoreError::Store("policy store mutex poisoned".to_string())
}

// ============================================================================
// SECTION: Shared Store Wrapper
// ============================================================================

/// Shared policy store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedPolicyStore {
    /// Inner store implementation.
    inner: Arc<dyn PolicyStore + Send + Sync>,
}

impl SharedPolicyStore {
    /// Wraps a policy store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl PolicyStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn PolicyStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl PolicyStore for SharedPolicyStore {
    fn get(&self, id: &PolicyId) -> Result<Option<Policy>, StoreError> {
        self.inner.get(id)
    }

    fn put(&self, policy: &Policy) -> Result<(), StoreError> {
        self.inner.put(policy)
    }

    fn delete(&self, id: &PolicyId) -> Result<bool, StoreError> {
        self.inner.delete(id)
    }

    fn list(&self) -> Result<Vec<PolicyId>, StoreError> {
        self.inner.list()
    }
}
