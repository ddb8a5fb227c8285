// crates/policy-flow-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Policy Store
// Description: Durable PolicyStore backend using SQLite.
// Purpose: Persist policy documents across restarts.
// Dependencies: policy-flow-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`PolicyStore`] implementation. Each
//! policy is stored as canonical JSON next to its content hash, and loads fail
//! closed when the row no longer matches its hash or its key.
//!
//! [`PolicyStore`]: policy_flow_core::PolicyStore

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::MAX_POLICY_BYTES;
pub use store::SqlitePolicyStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
