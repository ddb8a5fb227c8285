// crates/policy-flow-core/src/lib.rs
// ============================================================================
// Module: Policy Flow Core Library
// Description: Public API surface for the Policy Flow core.
// Purpose: Expose policy types, validation, storage interfaces, and runtime.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Policy Flow core validates block-graph decision policies and executes them
//! against runtime variable bindings. It is storage- and transport-agnostic:
//! persistence and request handling integrate through explicit interfaces.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::PolicyStore;
pub use interfaces::StoreError;
pub use runtime::Bindings;
pub use runtime::ControlPlaneError;
pub use runtime::ExecutionError;
pub use runtime::ExecutionLimits;
pub use runtime::ExecutionOutcome;
pub use runtime::Executor;
pub use runtime::InMemoryPolicyStore;
pub use runtime::Operator;
pub use runtime::PolicyControlPlane;
pub use runtime::RawBindings;
pub use runtime::SharedPolicyStore;
pub use runtime::collect_bindings;
pub use runtime::execute;
