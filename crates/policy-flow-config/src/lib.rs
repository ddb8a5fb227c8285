// crates/policy-flow-config/src/lib.rs
// ============================================================================
// Module: Policy Flow Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for policy-flow.toml semantics.
// Dependencies: policy-flow-core, policy-flow-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `policy-flow-config` defines the configuration model for the Policy Flow
//! server: bind address and body limit, store backend, execution limits, and
//! audit sink. Validation is strict and fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
