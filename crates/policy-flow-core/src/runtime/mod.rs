// crates/policy-flow-core/src/runtime/mod.rs
// ============================================================================
// Module: Policy Flow Runtime
// Description: Execution engine, comparators, control plane, and stores.
// Purpose: Execute stored policies against runtime bindings.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement operator evaluation, graph traversal, and the
//! control plane that every external surface calls into, plus in-memory
//! store implementations for tests and local use.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod comparator;
pub mod control_plane;
pub mod engine;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use comparator::Operator;
pub use control_plane::ControlPlaneError;
pub use control_plane::PolicyControlPlane;
pub use engine::Bindings;
pub use engine::ExecutionError;
pub use engine::ExecutionLimits;
pub use engine::ExecutionOutcome;
pub use engine::Executor;
pub use engine::RawBindings;
pub use engine::collect_bindings;
pub use engine::execute;
pub use store::InMemoryPolicyStore;
pub use store::SharedPolicyStore;
